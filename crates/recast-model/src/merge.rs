//! Recursive record merge
//!
//! Merging walks the source's declared attributes and writes each into the
//! target through its descriptor:
//!
//! - computed attributes without a writer are skipped
//! - absent values only reset the target when nulls are allowed
//! - scalars and lists overwrite
//! - a keyed collection replaces a non-collection wholesale
//! - two keyed collections merge entry by entry; records already present
//!   are merged in place, everything else is inserted, then entries are
//!   re-keyed and the collection is written back

use indexmap::IndexMap;
use tracing::trace;

use crate::error::Result;
use crate::record::Record;
use crate::value::Value;

impl Record {
    /// Merge `other` into this record
    ///
    /// # Errors
    /// Propagates read, validation and unknown-attribute failures. Writes
    /// applied before a failure are kept.
    pub fn merge(&mut self, other: &Record, nulls: bool) -> Result<&mut Self> {
        for (name, value) in other.iter() {
            if self.schema().attribute(name).is_some_and(|a| a.is_read_only()) {
                continue;
            }
            match value? {
                Value::None => {
                    if nulls {
                        trace!("merge {} reset", name);
                        self.set_item(name, Value::None)?;
                    }
                }
                Value::Map(incoming) => self.merge_entries(name, incoming)?,
                value => {
                    trace!("merge {} = {}", name, value);
                    self.set_item(name, value)?;
                }
            }
        }
        Ok(self)
    }

    /// Merge each of `others` in order; later sources win
    ///
    /// # Errors
    /// Same as [`Record::merge`]
    pub fn merge_from<'a, I>(&mut self, others: I, nulls: bool) -> Result<&mut Self>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        for other in others {
            self.merge(other, nulls)?;
        }
        Ok(self)
    }

    fn merge_entries(&mut self, name: &str, incoming: IndexMap<String, Value>) -> Result<()> {
        let Value::Map(mut current) = self.get_item(name)? else {
            trace!("merge {} replaced with {} entries", name, incoming.len());
            return self.set_item(name, Value::Map(incoming));
        };

        for (key, entry) in incoming {
            match (current.get_mut(&key), entry) {
                (Some(Value::Record(existing)), Value::Record(entry)) => {
                    trace!("merge {}[{}] in place", name, key);
                    existing.merge(&entry, false)?;
                }
                (_, entry) => {
                    trace!("merge {}[{}] inserted", name, key);
                    current.insert(key, entry);
                }
            }
        }

        let rekeyed = rekey(current)?;
        self.set_item(name, Value::Map(rekeyed))
    }
}

/// Re-derive collection keys from the records they hold
///
/// Non-record entries keep their key.
///
/// # Errors
/// Propagates key read failures
pub fn rekey(entries: IndexMap<String, Value>) -> Result<IndexMap<String, Value>> {
    entries
        .into_iter()
        .map(|(key, value)| match &value {
            Value::Record(record) => Ok((record.key()?, value)),
            _ => Ok((key, value)),
        })
        .collect()
}

/// Merge `source` into `target`
///
/// # Errors
/// Same as [`Record::merge`]
pub fn merge<'a>(target: &'a mut Record, source: &Record, nulls: bool) -> Result<&'a mut Record> {
    target.merge(source, nulls)
}

/// Merge `sources` into `target` in order
///
/// # Errors
/// Same as [`Record::merge`]
pub fn merge_from<'a, 'b, I>(target: &'a mut Record, sources: I, nulls: bool) -> Result<&'a mut Record>
where
    I: IntoIterator<Item = &'b Record>,
{
    target.merge_from(sources, nulls)
}
