use std::fmt;

/// Name of a logical collection of records.
///
/// In the file-backed store it is the key of the collection in the JSON
/// document; in the database backend it selects the entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelName(&'static str);

impl ModelName {
    pub const USER: ModelName = ModelName("User");

    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_collection_key() {
        assert_eq!(ModelName::USER.to_string(), "User");
        assert_eq!(ModelName::new("Order").as_str(), "Order");
        assert_ne!(ModelName::USER, ModelName::new("Order"));
    }
}
