use std::{
    cmp::min,
    fmt::{self, Display},
};

pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut first = true;
    for v in values {
        if !first {
            out.push_str(separator);
        }
        first = false;
        f(out, v);
    }
}

/// Fallible variant of [`separated_by`], stops at the first error.
pub fn try_separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) -> crate::Result<()>
where
    F: FnMut(&mut String, T) -> crate::Result<()>,
{
    let mut first = true;
    for v in values {
        if !first {
            out.push_str(separator);
        }
        first = false;
        f(out, v)?;
    }
    Ok(())
}

/// Displays at most ~500 bytes of a (possibly long) SQL text.
pub struct Truncated<'a>(pub &'a str);

impl Display for Truncated<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut end = min(self.0.len(), 497);
        while !self.0.is_char_boundary(end) {
            end -= 1;
        }
        f.write_str(self.0[..end].trim_end())?;
        if end < self.0.len() {
            f.write_str("...")?;
        }
        Ok(())
    }
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        $crate::Truncated(&$query)
    };
}
