// src/models/mod.rs
pub mod dashboard;
pub mod message;
pub mod note;
pub mod student;

use crate::error::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Formato gravado na DB: RFC3339 UTC com nanossegundos (largura fixa),
/// para que `ORDER BY` sobre o texto coincida com a ordem temporal.
pub fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn parse_ts(column: &str, raw: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::CorruptRow(format!("{} = '{}': {}", column, raw, e)))
}

pub fn parse_date(column: &str, raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| AppError::CorruptRow(format!("{} = '{}': {}", column, raw, e)))
}

/// Converte um inteiro da DB (i64) para o tipo da aplicação.
fn narrow<T: TryFrom<i64>>(column: &str, raw: i64) -> AppResult<T> {
    T::try_from(raw).map_err(|_| AppError::CorruptRow(format!("{} fora do intervalo: {}", column, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stored_timestamps_sort_like_time() {
        let a = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
        let b = a + chrono::Duration::milliseconds(500);
        let c = a + chrono::Duration::seconds(1);
        let (fa, fb, fc) = (format_ts(&a), format_ts(&b), format_ts(&c));
        assert!(fa < fb && fb < fc);
        assert_eq!(fa, "2024-03-15T10:00:00.000000000Z");
        assert_eq!(parse_ts("timestamp", &fb).unwrap(), b);
    }

    #[test]
    fn sub_microsecond_precision_survives_storage() {
        let a = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + chrono::Duration::nanoseconds(123_456_789);
        let b = a + chrono::Duration::nanoseconds(1);
        let (fa, fb) = (format_ts(&a), format_ts(&b));
        assert_eq!(fa, "2024-03-01T12:00:00.123456789Z");
        assert!(fa < fb);
        assert_eq!(parse_ts("last_activity", &fa).unwrap(), a);
    }

    #[test]
    fn bad_text_is_a_corrupt_row() {
        assert!(matches!(parse_ts("timestamp", "ontem"), Err(AppError::CorruptRow(_))));
        assert!(matches!(parse_date("enrollment_date", "15/01/2024"), Err(AppError::CorruptRow(_))));
    }
}
