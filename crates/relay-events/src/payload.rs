//! Harbor webhook payload (the "Default" payload format).
//!
//! Every field is optional on the wire. Missing, `null` or oddly typed
//! fields deserialize to empty values and are rendered as placeholders later,
//! so a sparse or sloppy payload never fails to parse. Maps whose order
//! matters (`scan_overview`, the severity breakdown) are kept as
//! `(key, value)` pairs in document order.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::kind::EventKind;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPayload {
    #[serde(rename = "type", default, deserialize_with = "lenient::tag")]
    pub event_type: String,
    /// Unix seconds.
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub occur_at: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub operator: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub event_data: EventData,
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        EventKind::from_tag(&self.event_type)
    }

    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.occur_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }

    pub fn resources(&self) -> &[Resource] {
        &self.event_data.resources
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventData {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub repository: Repository,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Repository {
    #[serde(default, deserialize_with = "lenient::text")]
    pub repo_full_name: Option<String>,
}

/// One artifact touched by the event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Resource {
    #[serde(default, deserialize_with = "lenient::text")]
    pub tag: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub digest: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub resource_url: Option<String>,
    /// Scanner report MIME type → scan result. Present on scan events only.
    #[serde(default, deserialize_with = "ordered::entries")]
    pub scan_overview: Vec<(String, ScanDetail)>,
}

impl Resource {
    /// The first scan report in document order, if any.
    pub fn first_scan(&self) -> Option<&ScanDetail> {
        self.scan_overview.first().map(|(_, detail)| detail)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanDetail {
    #[serde(default, deserialize_with = "lenient::text")]
    pub scan_status: Option<String>,
    /// Seconds.
    #[serde(default, deserialize_with = "lenient::number")]
    pub duration: i64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub severity: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub summary: VulnerabilitySummary,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub scanner: Scanner,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VulnerabilitySummary {
    #[serde(default, deserialize_with = "lenient::number")]
    pub total: i64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub fixable: i64,
    /// Severity label → count.
    #[serde(default, deserialize_with = "ordered::counts")]
    pub summary: Vec<(String, i64)>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scanner {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub version: Option<String>,
}

/// Field-level deserializers that degrade instead of failing.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Strings pass through, numbers and booleans become their text form,
    /// anything else is treated as absent.
    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn tag<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(text(d)?.unwrap_or_default())
    }

    /// Integers, floats (truncated) and numeric strings; anything else is 0.
    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        Ok(to_i64(&Value::deserialize(d)?).unwrap_or(0))
    }

    pub fn timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(to_i64(&Value::deserialize(d)?))
    }

    /// `null` yields `T::default()`.
    pub fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
    }

    pub(super) fn to_i64(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

mod ordered {
    use std::fmt;
    use std::marker::PhantomData;

    use serde::de::{Deserialize, Deserializer, Error, IgnoredAny, MapAccess, SeqAccess, Visitor};
    use serde_json::Value;

    /// Deserialize a JSON object into its entries, preserving document order.
    /// `null` or any non-object value yields no entries.
    pub fn entries<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = Vec<(String, T)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map")
            }

            fn visit_unit<E: Error>(self) -> Result<Self::Value, E> {
                Ok(Vec::new())
            }

            fn visit_none<E: Error>(self) -> Result<Self::Value, E> {
                Ok(Vec::new())
            }

            fn visit_bool<E: Error>(self, _: bool) -> Result<Self::Value, E> {
                Ok(Vec::new())
            }

            fn visit_i64<E: Error>(self, _: i64) -> Result<Self::Value, E> {
                Ok(Vec::new())
            }

            fn visit_u64<E: Error>(self, _: u64) -> Result<Self::Value, E> {
                Ok(Vec::new())
            }

            fn visit_f64<E: Error>(self, _: f64) -> Result<Self::Value, E> {
                Ok(Vec::new())
            }

            fn visit_str<E: Error>(self, _: &str) -> Result<Self::Value, E> {
                Ok(Vec::new())
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(Vec::new())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, T>()? {
                    entries.push(entry);
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_any(EntriesVisitor(PhantomData))
    }

    /// Ordered label → count entries; counts that are not numbers become 0.
    pub fn counts<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<(String, i64)>, D::Error> {
        struct Count(i64);

        impl<'de> Deserialize<'de> for Count {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                Ok(Count(super::lenient::to_i64(&Value::deserialize(d)?).unwrap_or(0)))
            }
        }

        Ok(entries::<D, Count>(d)?
            .into_iter()
            .map(|(label, Count(n))| (label, n))
            .collect())
    }
}
