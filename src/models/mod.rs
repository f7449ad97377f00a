mod page;
mod patch;
mod set;
mod user;
mod workout;

pub use page::{Page, Pagination};
pub use patch::Patch;
pub use set::{NewSet, SetId, SetPatch, SetTemplate, WorkoutSet};
pub use user::{
    Availability, NewWeight, Registration, TokenPair, User, UserPatch, WeightEntry, WeightId,
    WeightPatch,
};
pub use workout::{NewWorkout, Workout, WorkoutId, WorkoutPatch, WorkoutStatus};

/// Decimal fields arrive either as JSON numbers or as Django decimal strings ("82.50").
pub(crate) mod decimal {
    use serde::{de::Error, Deserialize, Deserializer};
    use serde_json::Value;

    fn parse<E: Error>(value: Value) -> Result<Option<f64>, E> {
        match value {
            Value::Null => Ok(None),
            Value::Number(number) => number
                .as_f64()
                .map(Some)
                .ok_or_else(|| E::custom("decimal out of range")),
            Value::String(text) if text.trim().is_empty() => Ok(None),
            Value::String(text) => text
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| E::custom(format!("invalid decimal '{text}'"))),
            other => Err(E::custom(format!("expected decimal, got {other}"))),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        parse(value)?.ok_or_else(|| D::Error::custom("missing decimal value"))
    }

    pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        parse(Value::deserialize(deserializer)?)
    }
}
