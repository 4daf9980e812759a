use crate::export::join_list;
use crate::models::{DietaryLog, MoodEntry, SleepRecord, SymptomLog, parse_stamp};
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Kind descriptor tying a record type to its collection, its ordering
/// stamp, and its fixed CSV shape. The four tracker kinds differ only in
/// the values here; all lifecycle logic is generic over this trait.
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Collection name inside the data file.
    const STORE: &'static str;
    /// Fixed export column order, including dormant schema fields.
    const CSV_HEADERS: &'static [&'static str];
    /// Fixed export download filename.
    const EXPORT_FILE: &'static str;
    /// Human label for notices and log lines.
    const LABEL: &'static str;

    /// Keys are assigned by the collection, never by callers.
    fn set_key(&mut self, key: u64);
    /// Primary timestamp used for newest-first display ordering.
    fn sort_stamp(&self) -> Option<NaiveDateTime>;
    /// Row values in `CSV_HEADERS` order; list fields already joined.
    fn csv_row(&self) -> Vec<String>;

    fn collection(data: &TrackerData) -> &Collection<Self>;
    fn collection_mut(data: &mut TrackerData) -> &mut Collection<Self>;
}

/// Append-only record collection with its own incrementing key counter.
/// No update, delete, or filtered query is exposed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection<R> {
    pub next_key: u64,
    pub records: Vec<R>,
}

impl<R> Default for Collection<R> {
    fn default() -> Self {
        Self {
            next_key: 1,
            records: Vec::new(),
        }
    }
}

impl<R: Record> Collection<R> {
    /// Inserts `record` under a freshly allocated key and returns the key.
    pub fn add(&mut self, mut record: R) -> u64 {
        let key = self.next_key;
        self.next_key += 1;
        record.set_key(key);
        self.records.push(record);
        key
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Full collection, newest first. Records whose stamp does not parse
    /// sort last; ties keep insertion order.
    pub fn sorted_desc(&self) -> Vec<R> {
        let mut records = self.records.clone();
        records.sort_by(|a, b| b.sort_stamp().cmp(&a.sort_stamp()));
        records
    }
}

/// The whole local database: four independently keyed collections in one
/// versioned file. `serde(default)` per field means a version bump that
/// introduces a new collection starts it empty instead of failing the load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerData {
    #[serde(default)]
    pub symptom_logs: Collection<SymptomLog>,
    #[serde(default)]
    pub dietary_logs: Collection<DietaryLog>,
    #[serde(default)]
    pub mood_entries: Collection<MoodEntry>,
    #[serde(default)]
    pub sleep_records: Collection<SleepRecord>,
}

impl Record for SymptomLog {
    const STORE: &'static str = "symptom_logs";
    const CSV_HEADERS: &'static [&'static str] = &[
        "log_id",
        "user_id",
        "timestamp",
        "symptom_type",
        "severity",
        "duration_minutes",
        "location",
        "description",
        "associated_triggers",
        "relief_measures",
        "photos",
    ];
    const EXPORT_FILE: &'static str = "mcas_symptoms_log.csv";
    const LABEL: &'static str = "symptom log";

    fn set_key(&mut self, key: u64) {
        self.log_id = key;
    }

    fn sort_stamp(&self) -> Option<NaiveDateTime> {
        parse_stamp(&self.timestamp)
    }

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.log_id.to_string(),
            self.user_id.clone(),
            self.timestamp.clone(),
            self.symptom_type.clone(),
            self.severity.to_string(),
            self.duration_minutes
                .map(|minutes| minutes.to_string())
                .unwrap_or_default(),
            self.location.clone(),
            self.description.clone(),
            join_list(&self.associated_triggers),
            self.relief_measures.clone(),
            join_list(&self.photos),
        ]
    }

    fn collection(data: &TrackerData) -> &Collection<Self> {
        &data.symptom_logs
    }

    fn collection_mut(data: &mut TrackerData) -> &mut Collection<Self> {
        &mut data.symptom_logs
    }
}

impl Record for DietaryLog {
    const STORE: &'static str = "dietary_logs";
    const CSV_HEADERS: &'static [&'static str] = &[
        "meal_id",
        "user_id",
        "timestamp",
        "meal_type",
        "foods",
        "perceived_histamine_level",
        "notes",
    ];
    const EXPORT_FILE: &'static str = "mcas_diet_log.csv";
    const LABEL: &'static str = "dietary log";

    fn set_key(&mut self, key: u64) {
        self.meal_id = key;
    }

    fn sort_stamp(&self) -> Option<NaiveDateTime> {
        parse_stamp(&self.timestamp)
    }

    fn csv_row(&self) -> Vec<String> {
        let foods: Vec<String> = self.foods.iter().map(|food| food.name.clone()).collect();
        vec![
            self.meal_id.to_string(),
            self.user_id.clone(),
            self.timestamp.clone(),
            self.meal_type.clone(),
            join_list(&foods),
            self.perceived_histamine_level.clone(),
            self.notes.clone(),
        ]
    }

    fn collection(data: &TrackerData) -> &Collection<Self> {
        &data.dietary_logs
    }

    fn collection_mut(data: &mut TrackerData) -> &mut Collection<Self> {
        &mut data.dietary_logs
    }
}

impl Record for MoodEntry {
    const STORE: &'static str = "mood_entries";
    const CSV_HEADERS: &'static [&'static str] = &[
        "mood_id",
        "user_id",
        "timestamp",
        "emotional_state",
        "severity",
        "cognitive_symptoms",
        "psychosocial_stressors",
        "notes",
    ];
    const EXPORT_FILE: &'static str = "mcas_mood_log.csv";
    const LABEL: &'static str = "mood entry";

    fn set_key(&mut self, key: u64) {
        self.mood_id = key;
    }

    fn sort_stamp(&self) -> Option<NaiveDateTime> {
        parse_stamp(&self.timestamp)
    }

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.mood_id.to_string(),
            self.user_id.clone(),
            self.timestamp.clone(),
            self.emotional_state.clone(),
            self.severity.to_string(),
            join_list(&self.cognitive_symptoms),
            join_list(&self.psychosocial_stressors),
            self.notes.clone(),
        ]
    }

    fn collection(data: &TrackerData) -> &Collection<Self> {
        &data.mood_entries
    }

    fn collection_mut(data: &mut TrackerData) -> &mut Collection<Self> {
        &mut data.mood_entries
    }
}

impl Record for SleepRecord {
    const STORE: &'static str = "sleep_records";
    const CSV_HEADERS: &'static [&'static str] = &[
        "sleep_id",
        "user_id",
        "start_time",
        "end_time",
        "duration_hours",
        "quality",
        "disturbances",
        "sleep_stages",
        "notes",
    ];
    const EXPORT_FILE: &'static str = "mcas_sleep_log.csv";
    const LABEL: &'static str = "sleep record";

    fn set_key(&mut self, key: u64) {
        self.sleep_id = key;
    }

    fn sort_stamp(&self) -> Option<NaiveDateTime> {
        parse_stamp(&self.start_time)
    }

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.sleep_id.to_string(),
            self.user_id.clone(),
            self.start_time.clone(),
            self.end_time.clone(),
            self.duration_hours
                .map(|hours| hours.to_string())
                .unwrap_or_default(),
            self.quality.to_string(),
            join_list(&self.disturbances),
            serde_json::to_string(&self.sleep_stages).unwrap_or_default(),
            self.notes.clone(),
        ]
    }

    fn collection(data: &TrackerData) -> &Collection<Self> {
        &data.sleep_records
    }

    fn collection_mut(data: &mut TrackerData) -> &mut Collection<Self> {
        &mut data.sleep_records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_USER;

    fn mood(timestamp: &str) -> MoodEntry {
        MoodEntry {
            mood_id: 0,
            user_id: DEFAULT_USER.to_string(),
            timestamp: timestamp.to_string(),
            emotional_state: "Calm".to_string(),
            severity: 2,
            cognitive_symptoms: Vec::new(),
            psychosocial_stressors: Vec::new(),
            notes: String::new(),
        }
    }

    #[test]
    fn add_assigns_sequential_keys() {
        let mut collection = Collection::<MoodEntry>::default();
        assert_eq!(collection.add(mood("2026-08-01T08:00")), 1);
        assert_eq!(collection.add(mood("2026-08-01T09:00")), 2);
        assert_eq!(collection.add(mood("2026-08-01T10:00")), 3);
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.records[2].mood_id, 3);
    }

    #[test]
    fn sorted_desc_puts_newest_first() {
        let mut collection = Collection::<MoodEntry>::default();
        collection.add(mood("2026-08-01T08:00"));
        collection.add(mood("2026-08-03T08:00"));
        collection.add(mood("2026-08-02T08:00"));

        let sorted = collection.sorted_desc();
        let stamps: Vec<&str> = sorted.iter().map(|m| m.timestamp.as_str()).collect();
        assert_eq!(
            stamps,
            vec!["2026-08-03T08:00", "2026-08-02T08:00", "2026-08-01T08:00"]
        );
    }

    #[test]
    fn sorted_desc_unparseable_stamps_sort_last() {
        let mut collection = Collection::<MoodEntry>::default();
        collection.add(mood("garbage"));
        collection.add(mood("2026-08-02T08:00"));

        let sorted = collection.sorted_desc();
        assert_eq!(sorted[0].timestamp, "2026-08-02T08:00");
        assert_eq!(sorted[1].timestamp, "garbage");
    }

    #[test]
    fn missing_collection_defaults_on_load() {
        // A data file written before a collection existed still loads.
        let partial = r#"{"symptom_logs":{"next_key":4,"records":[]}}"#;
        let data: TrackerData = serde_json::from_str(partial).expect("older file loads");
        assert_eq!(data.symptom_logs.next_key, 4);
        assert_eq!(data.sleep_records.next_key, 1);
        assert!(data.sleep_records.is_empty());
    }
}
