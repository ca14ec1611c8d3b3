use quarry::{ColumnDeclaring, Database, Executor, Table, Value};
use rust_decimal::Decimal;
use std::str::FromStr;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time,
    macros::{date, datetime, time},
};

pub(crate) fn types(database: &Database) {
    let table = Table::new("t_value");
    let id = table.column::<i64>("id");
    let flag = table.column::<bool>("flag");
    let small = table.column::<i16>("small");
    let number = table.column::<i32>("number");
    let big = table.column::<i64>("big");
    let ratio = table.column::<f64>("ratio");
    let amount = table.column::<Decimal>("amount");
    let label = table.column::<String>("label");
    let content = table.column::<Vec<u8>>("content");
    let day = table.column::<Date>("day");
    let moment = table.column::<Time>("moment");
    let stamp = table.column::<PrimitiveDateTime>("stamp");
    let stamp_tz = table.column::<OffsetDateTime>("stamp_tz");
    let uid = table.column::<uuid::Uuid>("uid");
    database.delete_all(&table).unwrap();

    let amount_value = Decimal::from_str("1234.5").unwrap();
    let uid_value = uuid::Uuid::from_u128(0x6f1c_2e4a_9b7d_4c3e_8a5f_0d1b_2c3d_4e5f);
    database
        .insert(&table, |v| {
            v.set(&id, 1)
                .set(&flag, true)
                .set(&small, -12i16)
                .set(&number, 123_456)
                .set(&big, 9_007_199_254_740_993i64)
                .set(&ratio, 0.25)
                .set(&amount, amount_value)
                .set(&label, "Quarry 'quoted' text")
                .set(&content, vec![0u8, 1, 2, 254, 255])
                .set(&day, date!(2024 - 02 - 29))
                .set(&moment, time!(23:59:58.5))
                .set(&stamp, datetime!(2024-02-29 12:30:45.25))
                .set(&stamp_tz, datetime!(2024-02-29 12:30:45 +02:00))
                .set(&uid, uid_value);
        })
        .expect("Could not insert the values");
    database
        .insert(&table, |v| {
            v.set(&id, 2)
                .set_null(&flag)
                .set_null(&number)
                .set_null(&label)
                .set_null(&content)
                .set_null(&day);
        })
        .expect("Could not insert the NULL values");

    let mut rows = database
        .from(&table)
        .select_all()
        .order_by([id.asc()])
        .row_set()
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.next());
    assert_eq!(rows.get::<bool>("flag").unwrap(), Some(true));
    assert_eq!(rows.get::<i16>("small").unwrap(), Some(-12));
    assert_eq!(rows.get::<i32>("number").unwrap(), Some(123_456));
    assert_eq!(rows.get::<i64>("big").unwrap(), Some(9_007_199_254_740_993));
    assert_eq!(rows.get::<f64>("ratio").unwrap(), Some(0.25));
    assert_eq!(rows.get::<Decimal>("amount").unwrap(), Some(amount_value));
    assert_eq!(
        rows.get::<String>("label").unwrap(),
        Some("Quarry 'quoted' text".into())
    );
    assert_eq!(
        rows.get::<Vec<u8>>("content").unwrap(),
        Some(vec![0, 1, 2, 254, 255])
    );
    assert_eq!(rows.get::<Date>("day").unwrap(), Some(date!(2024 - 02 - 29)));
    assert_eq!(rows.get::<Time>("moment").unwrap(), Some(time!(23:59:58.5)));
    assert_eq!(
        rows.get::<PrimitiveDateTime>("stamp").unwrap(),
        Some(datetime!(2024-02-29 12:30:45.25))
    );
    assert_eq!(
        rows.get::<OffsetDateTime>("stamp_tz").unwrap(),
        Some(datetime!(2024-02-29 12:30:45 +02:00))
    );
    assert_eq!(rows.get::<uuid::Uuid>("uid").unwrap(), Some(uid_value));
    // Integers read through a wider or a textual type
    assert_eq!(rows.get::<f64>("number").unwrap(), Some(123_456.0));
    assert_eq!(rows.get::<String>("day").unwrap(), Some("2024-02-29".into()));
    assert!(rows.get::<i16>("number").is_err());

    assert!(rows.next());
    assert_eq!(rows.get_value("flag").unwrap(), Value::Null);
    assert!(rows.was_null());
    assert_eq!(rows.get::<i32>("number").unwrap(), None);
    assert_eq!(rows.get::<String>("label").unwrap(), None);
    assert_eq!(rows.get::<Vec<u8>>("content").unwrap(), None);
    assert_eq!(rows.get::<Date>("day").unwrap(), None);
    assert_eq!(rows.get::<Option<Date>>("day").unwrap(), None);

    // Values as conditions
    let found = database
        .from(&table)
        .select(id.clone())
        .filter(day.eq(date!(2024 - 02 - 29)))
        .map_rows(|v| v.get_column(&id))
        .unwrap();
    assert_eq!(found, [Some(1)]);
    let found = database
        .from(&table)
        .select(id.clone())
        .filter(uid.eq(uid_value))
        .map_rows(|v| v.get_column(&id))
        .unwrap();
    assert_eq!(found, [Some(1)]);
    database.delete_all(&table).unwrap();
}
