//! Save-task classification and audit stamping.

use crate::app::options::ModelOptions;
use crate::domain::model::{exclude_field, record_id, FieldValue, Filter, Record, ID_FIELD};
use chrono::Utc;

/// What a Save call turns into, decided only from the shape of its input.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveTask {
    Create(Vec<Record>),
    UpdateById { record: Record, id: String },
    UpdateByIds { record: Record, ids: Vec<String> },
    UpdateByParam { record: Record, filter: Filter },
    /// Several records, each carrying its own id.
    UpdateBatch(Vec<Record>),
    /// A batch mixing new and existing records.
    Mixed,
    /// No records at all.
    Empty,
}

/// Classifies a Save call.
///
/// A single record is an update when target ids or a filter are supplied, or when it
/// carries a non-empty id; otherwise it is a create. Batches ignore ids/filter and are
/// split per record by the same id rule. The `id` field is dropped from every record
/// except those of an [`SaveTask::UpdateBatch`].
pub fn classify_save(records: &[Record], record_ids: &[String], filter: &Filter) -> SaveTask {
    match records {
        [] => SaveTask::Empty,
        [record] => {
            let stripped = exclude_field(record, ID_FIELD);
            if record_ids.len() == 1 {
                SaveTask::UpdateById { record: stripped, id: record_ids[0].clone() }
            } else if record_ids.len() > 1 {
                SaveTask::UpdateByIds { record: stripped, ids: record_ids.to_vec() }
            } else if !filter.is_empty() {
                SaveTask::UpdateByParam { record: stripped, filter: filter.clone() }
            } else if let Some(id) = record_id(record) {
                SaveTask::UpdateById { record: stripped, id }
            } else {
                SaveTask::Create(vec![stripped])
            }
        }
        many => {
            let mut creates = Vec::new();
            let mut updates = Vec::new();
            for record in many {
                if record_id(record).is_some() {
                    updates.push(record.clone());
                } else {
                    creates.push(exclude_field(record, ID_FIELD));
                }
            }
            match (creates.is_empty(), updates.is_empty()) {
                (false, false) => SaveTask::Mixed,
                (false, true) => SaveTask::Create(creates),
                (true, false) => SaveTask::UpdateBatch(updates),
                (true, true) => SaveTask::Empty,
            }
        }
    }
}

pub fn stamp_create(record: &mut Record, user_id: &str, options: &ModelOptions) {
    if options.actor_stamp {
        record.insert("createdBy".to_string(), FieldValue::from(user_id));
    }
    if options.time_stamp {
        record.insert("createdAt".to_string(), FieldValue::Timestamp(Utc::now()));
    }
    if options.active_stamp && !record.contains_key("isActive") {
        record.insert("isActive".to_string(), FieldValue::Bool(true));
    }
}

pub fn stamp_update(record: &mut Record, user_id: &str, options: &ModelOptions) {
    if options.actor_stamp {
        record.insert("updatedBy".to_string(), FieldValue::from(user_id));
    }
    if options.time_stamp {
        record.insert("updatedAt".to_string(), FieldValue::Timestamp(Utc::now()));
    }
}
