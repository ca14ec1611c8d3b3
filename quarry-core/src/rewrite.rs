use crate::{
    ArgumentExpression, ColumnDeclaringExpression, ColumnExpression, ExprRef, ExpressionKind,
    ExpressionVisitor, Result, SelectExpression, SqlError, TableExpression, UnionExpression,
    walk_column_declaring,
};

/// Strips table aliases and the table qualification of columns, used before executing DML.
///
/// Sub-queries are left untouched, they may legitimately reference their own aliases.
#[derive(Debug, Default)]
pub struct AliasRemover;

impl ExpressionVisitor for AliasRemover {
    fn visit_table(&mut self, expr: &ExprRef, table: &TableExpression) -> Result<ExprRef> {
        if table.alias.is_none() {
            return Ok(expr.clone());
        }
        Ok(expr.rebuild(TableExpression {
            alias: None,
            ..table.clone()
        }))
    }

    fn visit_column(&mut self, expr: &ExprRef, column: &ColumnExpression) -> Result<ExprRef> {
        if column.table.is_none() {
            return Ok(expr.clone());
        }
        Ok(expr.rebuild(ColumnExpression {
            table: None,
            ..column.clone()
        }))
    }

    fn visit_select(&mut self, expr: &ExprRef, _select: &SelectExpression) -> Result<ExprRef> {
        Ok(expr.clone())
    }

    fn visit_union(&mut self, expr: &ExprRef, _union: &UnionExpression) -> Result<ExprRef> {
        Ok(expr.clone())
    }
}

/// Finds out whether a tree contains at least one bound argument.
#[derive(Debug, Default)]
pub struct ArgumentFinder {
    pub found: bool,
}

impl ArgumentFinder {
    pub fn contains_argument(expr: &ExprRef) -> Result<bool> {
        let mut finder = Self::default();
        finder.visit(expr)?;
        Ok(finder.found)
    }
}

impl ExpressionVisitor for ArgumentFinder {
    fn visit_argument(
        &mut self,
        expr: &ExprRef,
        _argument: &ArgumentExpression,
    ) -> Result<ExprRef> {
        self.found = true;
        Ok(expr.clone())
    }
}

/// Removes the top level ORDER BY of a query before counting its rows.
///
/// Ordering terms that reference a bound argument are kept: dropping them would shift the
/// positions of the parameters that follow.
#[derive(Debug, Default)]
pub struct OrderByRemover;

impl OrderByRemover {
    fn retain(order_by: &[ExprRef]) -> Result<Vec<ExprRef>> {
        let mut result = Vec::new();
        for v in order_by {
            if ArgumentFinder::contains_argument(v)? {
                result.push(v.clone());
            }
        }
        Ok(result)
    }
}

impl ExpressionVisitor for OrderByRemover {
    fn visit(&mut self, expr: &ExprRef) -> Result<ExprRef> {
        match &expr.kind {
            ExpressionKind::Select(select) => {
                let order_by = Self::retain(&select.order_by)?;
                if order_by.len() == select.order_by.len() {
                    return Ok(expr.clone());
                }
                Ok(expr.rebuild(SelectExpression {
                    order_by,
                    ..select.clone()
                }))
            }
            ExpressionKind::Union(union) => {
                let order_by = Self::retain(&union.order_by)?;
                if order_by.len() == union.order_by.len() {
                    return Ok(expr.clone());
                }
                Ok(expr.rebuild(UnionExpression {
                    order_by,
                    ..union.clone()
                }))
            }
            _ => Ok(expr.clone()),
        }
    }
}

/// Fails on the first column or declared label longer than the database allows.
#[derive(Debug)]
pub struct ColumnNameLengthChecker {
    /// Zero means unlimited.
    pub max_length: usize,
}

impl ColumnNameLengthChecker {
    fn check(&self, name: &str) -> Result<()> {
        if self.max_length > 0 && name.chars().count() > self.max_length {
            return Err(SqlError::IdentifierTooLong {
                name: name.to_string(),
                max: self.max_length,
            }
            .into());
        }
        Ok(())
    }
}

impl ExpressionVisitor for ColumnNameLengthChecker {
    fn visit_column(&mut self, expr: &ExprRef, column: &ColumnExpression) -> Result<ExprRef> {
        self.check(&column.name)?;
        Ok(expr.clone())
    }

    fn visit_column_declaring(
        &mut self,
        expr: &ExprRef,
        column: &ColumnDeclaringExpression,
    ) -> Result<ExprRef> {
        if let Some(name) = &column.declared_name {
            self.check(name)?;
        }
        walk_column_declaring(self, expr, column)
    }
}
