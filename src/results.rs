use serde::{Deserialize, Serialize};

/// A product listing extracted from a page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Product name (never empty)
    pub name: String,

    /// Displayed price, trimmed
    pub price: String,

    /// Image URL as found in the markup
    pub image: String,

    /// Product page URL as found in the markup
    pub url: String,
}

impl Record {
    /// Column order used by the CSV sink
    pub const HEADERS: [&'static str; 4] = ["name", "price", "image", "url"];

    /// Builds a record from raw field values.
    ///
    /// Whitespace is trimmed from every field. Returns `None` when the name is
    /// empty after trimming, since such an item cannot be identified.
    pub fn from_fields(
        name: impl AsRef<str>,
        price: impl AsRef<str>,
        image: impl AsRef<str>,
        url: impl AsRef<str>,
    ) -> Option<Self> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            price: price.as_ref().trim().to_string(),
            image: image.as_ref().trim().to_string(),
            url: url.as_ref().trim().to_string(),
        })
    }

    /// Field values in `HEADERS` order
    pub fn fields(&self) -> [&str; 4] {
        [&self.name, &self.price, &self.image, &self.url]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fields_trims() {
        let record = Record::from_fields(" Abominable Hoodie ", "\n  $69.00\n", "/img.jpg", " /p/1 ")
            .unwrap();
        assert_eq!(record.name, "Abominable Hoodie");
        assert_eq!(record.price, "$69.00");
        assert_eq!(record.url, "/p/1");
    }

    #[test]
    fn test_empty_name_is_dropped() {
        assert!(Record::from_fields("", "$1", "a.png", "/a").is_none());
        assert!(Record::from_fields("   \t", "$1", "a.png", "/a").is_none());
    }

    #[test]
    fn test_trim_is_idempotent() {
        let once = Record::from_fields("Tee", "  $5.00 ", "", "").unwrap();
        let twice = Record::from_fields(&once.name, &once.price, &once.image, &once.url).unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.price, "$5.00");
    }

    #[test]
    fn test_fields_follow_header_order() {
        let record = Record::from_fields("n", "p", "i", "u").unwrap();
        assert_eq!(record.fields(), ["n", "p", "i", "u"]);
    }
}
