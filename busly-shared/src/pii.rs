use serde::{Serialize, Deserialize, Serializer};
use std::fmt;

/// Wraps a sensitive value (phone numbers, emails) so that `Debug` and
/// `Display` only reveal its last two characters. Serialization is untouched
/// because API responses need the real value.
#[derive(Clone, Deserialize)]
pub struct Masked<T>(pub T);

impl<T: fmt::Display> Masked<T> {
    fn masked(&self) -> String {
        let raw = self.0.to_string();
        let visible = raw.chars().count().saturating_sub(2);
        raw.chars()
            .enumerate()
            .map(|(i, c)| if i < visible { '*' } else { c })
            .collect()
    }
}

impl<T: fmt::Display> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked())
    }
}

impl<T: fmt::Display> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked())
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_is_masked_in_logs() {
        let phone = Masked("+919876543210");
        assert_eq!(format!("{}", phone), "***********10");
        assert_eq!(format!("{:?}", phone), "***********10");
        assert_eq!(serde_json::to_string(&phone).unwrap(), "\"+919876543210\"");
    }

    #[test]
    fn test_short_values() {
        assert_eq!(Masked("7").to_string(), "7");
        assert_eq!(Masked(String::new()).to_string(), "");
    }
}
