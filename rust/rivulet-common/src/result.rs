pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// Checks a property of decoded data, returning `InvalidFormat` from the
/// enclosing function when it does not hold.
#[macro_export]
macro_rules! verify_data {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_data(result, stringify!($name), stringify!($expr))?;
    }};
}

#[inline]
pub fn verify_data(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_format(name, condition)
    }
}

#[cold]
pub fn invalid_format(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidFormat {
        element: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}
