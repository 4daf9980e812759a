use crate::errors::AppError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Single-user deployment; every record carries this id so a future
/// multi-user schema bump stays a data migration, not a shape change.
pub const DEFAULT_USER: &str = "default_user";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomLog {
    #[serde(default)]
    pub log_id: u64,
    pub user_id: String,
    pub timestamp: String,
    pub symptom_type: String,
    pub severity: u8,
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    pub associated_triggers: Vec<String>,
    pub relief_measures: String,
    #[serde(default)]
    pub photos: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub preparation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietaryLog {
    #[serde(default)]
    pub meal_id: u64,
    pub user_id: String,
    pub timestamp: String,
    pub meal_type: String,
    pub foods: Vec<FoodItem>,
    pub perceived_histamine_level: String,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodEntry {
    #[serde(default)]
    pub mood_id: u64,
    pub user_id: String,
    pub timestamp: String,
    pub emotional_state: String,
    pub severity: u8,
    pub cognitive_symptoms: Vec<String>,
    pub psychosocial_stressors: Vec<String>,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepRecord {
    #[serde(default)]
    pub sleep_id: u64,
    pub user_id: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_hours: Option<f64>,
    pub quality: u8,
    pub disturbances: Vec<String>,
    /// Placeholder for a per-stage breakdown; no producer exists yet.
    #[serde(default)]
    pub sleep_stages: BTreeMap<String, f64>,
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct SymptomForm {
    pub timestamp: String,
    pub symptom_type: String,
    pub severity: String,
    #[serde(default)]
    pub duration_minutes: String,
    #[serde(default)]
    pub associated_triggers: String,
    #[serde(default)]
    pub relief_measures: String,
}

#[derive(Debug, Deserialize)]
pub struct DietForm {
    pub timestamp: String,
    pub meal_type: String,
    #[serde(default)]
    pub foods: String,
    pub perceived_histamine_level: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct MoodForm {
    pub timestamp: String,
    pub emotional_state: String,
    pub severity: String,
    #[serde(default)]
    pub cognitive_symptoms: String,
    #[serde(default)]
    pub psychosocial_stressors: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct SleepForm {
    pub start_time: String,
    pub end_time: String,
    pub quality: String,
    #[serde(default)]
    pub disturbances: String,
    #[serde(default)]
    pub notes: String,
}

/// Payload an external push producer would deliver. No backend sends these
/// today; the endpoint only logs what it would display.
#[derive(Debug, Deserialize)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub tag: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub url: String,
}

impl SymptomForm {
    pub fn normalize(self) -> Result<SymptomLog, AppError> {
        let symptom_type = required(&self.symptom_type, "symptom type")?;
        let severity = parse_scale(&self.severity, "severity", 10)?;
        let duration_minutes = match self.duration_minutes.trim() {
            "" => None,
            raw => Some(raw.parse::<u32>().map_err(|_| {
                AppError::bad_request("duration must be a whole number of minutes")
            })?),
        };

        Ok(SymptomLog {
            log_id: 0,
            user_id: DEFAULT_USER.to_string(),
            timestamp: self.timestamp.trim().to_string(),
            symptom_type,
            severity,
            duration_minutes,
            location: String::new(),
            description: String::new(),
            associated_triggers: split_list(&self.associated_triggers),
            relief_measures: self.relief_measures.trim().to_string(),
            photos: Vec::new(),
        })
    }
}

impl DietForm {
    pub fn normalize(self) -> Result<DietaryLog, AppError> {
        let meal_type = required(&self.meal_type, "meal type")?;
        let foods = split_list(&self.foods)
            .into_iter()
            .map(|name| FoodItem {
                name,
                quantity: String::new(),
                components: Vec::new(),
                preparation: String::new(),
            })
            .collect();

        Ok(DietaryLog {
            meal_id: 0,
            user_id: DEFAULT_USER.to_string(),
            timestamp: self.timestamp.trim().to_string(),
            meal_type,
            foods,
            perceived_histamine_level: self.perceived_histamine_level.trim().to_string(),
            notes: self.notes.trim().to_string(),
        })
    }
}

impl MoodForm {
    pub fn normalize(self) -> Result<MoodEntry, AppError> {
        let emotional_state = required(&self.emotional_state, "emotional state")?;
        let severity = parse_scale(&self.severity, "severity", 10)?;

        Ok(MoodEntry {
            mood_id: 0,
            user_id: DEFAULT_USER.to_string(),
            timestamp: self.timestamp.trim().to_string(),
            emotional_state,
            severity,
            cognitive_symptoms: split_list(&self.cognitive_symptoms),
            psychosocial_stressors: split_list(&self.psychosocial_stressors),
            notes: self.notes.trim().to_string(),
        })
    }
}

impl SleepForm {
    pub fn normalize(self) -> Result<SleepRecord, AppError> {
        let quality = parse_scale(&self.quality, "quality", 5)?;
        let start_time = self.start_time.trim().to_string();
        let end_time = self.end_time.trim().to_string();
        let duration_hours = match (parse_stamp(&start_time), parse_stamp(&end_time)) {
            (Some(start), Some(end)) if end > start => {
                Some((end - start).num_seconds() as f64 / 3600.0)
            }
            _ => None,
        };

        Ok(SleepRecord {
            sleep_id: 0,
            user_id: DEFAULT_USER.to_string(),
            start_time,
            end_time,
            duration_hours,
            quality,
            disturbances: split_list(&self.disturbances),
            sleep_stages: BTreeMap::new(),
            notes: self.notes.trim().to_string(),
        })
    }
}

/// Comma-separated user input into an ordered list of trimmed,
/// non-empty strings.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Form timestamps come from `datetime-local` inputs, so seconds are
/// usually absent. Records keep the submitted string verbatim; parsing is
/// only for ordering and duration math.
pub fn parse_stamp(raw: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

fn required(raw: &str, field: &str) -> Result<String, AppError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(AppError::bad_request(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn parse_scale(raw: &str, field: &str, max: u8) -> Result<u8, AppError> {
    let value: u8 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::bad_request(format!("{field} must be a number")))?;
    if value < 1 || value > max {
        return Err(AppError::bad_request(format!(
            "{field} must be between 1 and {max}"
        )));
    }
    Ok(value)
}
