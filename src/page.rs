use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Resources listed in pages name the property holding the items of the page envelope.
pub trait PageItem {
    const ITEMS_KEY: &'static str;
}

/// A page of results.
///
/// List endpoints answer with a bare array unless totals or checkpoint pagination were
/// requested, in which case the items come inside an envelope with the counters. Both shapes
/// decode to a `Page`; counters missing from the response are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    items: Vec<T>,
    start: Option<u64>,
    length: Option<u64>,
    total: Option<u64>,
    limit: Option<u64>,
    next: Option<String>,
}

impl<T> Page<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn start(&self) -> Option<u64> {
        self.start
    }

    pub fn length(&self) -> Option<u64> {
        self.length
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Checkpoint to request the following page, when paginating with `from` and `take`.
    pub fn next(&self) -> Option<&str> {
        self.next.as_deref()
    }
}

impl<'de, T> Deserialize<'de> for Page<T>
where
    T: DeserializeOwned + PageItem,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Array(items) => Ok(Page {
                items: decode_items(items).map_err(D::Error::custom)?,
                start: None,
                length: None,
                total: None,
                limit: None,
                next: None,
            }),
            Value::Object(mut envelope) => {
                let items = match envelope.remove(T::ITEMS_KEY) {
                    Some(Value::Array(items)) => decode_items(items).map_err(D::Error::custom)?,
                    None | Some(Value::Null) => Vec::new(),
                    Some(_) => {
                        return Err(D::Error::custom(format!(
                            "`{}` must be an array",
                            T::ITEMS_KEY
                        )));
                    }
                };
                Ok(Page {
                    items,
                    start: counter(&envelope, "start"),
                    length: counter(&envelope, "length"),
                    total: counter(&envelope, "total"),
                    limit: counter(&envelope, "limit"),
                    next: envelope
                        .get("next")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
            }
            _ => Err(D::Error::custom("expected a page array or envelope")),
        }
    }
}

fn decode_items<T: DeserializeOwned>(items: Vec<Value>) -> Result<Vec<T>, serde_json::Error> {
    items.into_iter().map(serde_json::from_value).collect()
}

fn counter(envelope: &Map<String, Value>, key: &str) -> Option<u64> {
    envelope.get(key).and_then(Value::as_u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Thing {
        id: String,
    }

    impl PageItem for Thing {
        const ITEMS_KEY: &'static str = "things";
    }

    #[test]
    fn bare_array_has_no_counters() {
        let page: Page<Thing> = serde_json::from_str(r#"[{"id":"1"}]"#).unwrap();

        assert_eq!(page.items(), &[Thing { id: "1".into() }]);
        assert_eq!(page.start(), None);
        assert_eq!(page.length(), None);
        assert_eq!(page.total(), None);
        assert_eq!(page.limit(), None);
    }

    #[test]
    fn envelope_has_counters() {
        let page: Page<Thing> = serde_json::from_str(
            r#"{"start":0,"length":1,"total":1,"limit":50,"things":[{"id":"1"}]}"#,
        )
        .unwrap();

        assert_eq!(page.items(), &[Thing { id: "1".into() }]);
        assert_eq!(page.start(), Some(0));
        assert_eq!(page.length(), Some(1));
        assert_eq!(page.total(), Some(1));
        assert_eq!(page.limit(), Some(50));
        assert_eq!(page.next(), None);
    }

    #[test]
    fn checkpoint_envelope_has_next() {
        let page: Page<Thing> =
            serde_json::from_str(r#"{"things":[],"next":"MjAyMS0wMy0yOQ"}"#).unwrap();

        assert!(page.items().is_empty());
        assert_eq!(page.next(), Some("MjAyMS0wMy0yOQ"));
    }

    #[test]
    fn invalid_shapes_are_rejected() {
        assert!(serde_json::from_str::<Page<Thing>>("42").is_err());
        assert!(serde_json::from_str::<Page<Thing>>(r#"{"things":{}}"#).is_err());
        assert!(serde_json::from_str::<Page<Thing>>(r#"[{"name":"no id"}]"#).is_err());
    }
}
