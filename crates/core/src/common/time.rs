use crate::market::entity::FetchRange;
use crate::market::error::MarketError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

const SECONDS_PER_HOUR: i32 = 3600;

/// # Summary
/// 客户端描述时间范围的两种方式。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeInput {
    /// 本地日历日期 (`YYYY-MM-DD`)，缺省结束日期时按单日处理
    Dates { start: String, end: Option<String> },
    /// UTC 毫秒时间戳，原样透传
    Timestamps { start: i64, end: Option<i64> },
}

/// # Summary
/// 固定时区偏移下的本地日历，负责把日期解释为 UTC 毫秒区间。
///
/// # Invariants
/// - 偏移量在构造后不可变，解析是纯函数，无副作用。
#[derive(Debug, Clone, Copy)]
pub struct LocalCalendar {
    offset: FixedOffset,
}

impl LocalCalendar {
    /// # Summary
    /// 以整点小时偏移创建本地日历。
    ///
    /// # Arguments
    /// * `offset_hours`: 相对 UTC 的小时偏移，例如迪拜为 `4`。
    ///
    /// # Returns
    /// 偏移超出 ±14 小时返回 `InvalidRequest`。
    pub fn new(offset_hours: i32) -> Result<Self, MarketError> {
        offset_hours
            .checked_mul(SECONDS_PER_HOUR)
            .and_then(FixedOffset::east_opt)
            .filter(|_| (-14..=14).contains(&offset_hours))
            .map(|offset| Self { offset })
            .ok_or_else(|| {
                MarketError::InvalidRequest(format!("utc offset out of range: {}h", offset_hours))
            })
    }

    /// # Summary
    /// 计算本地某一日历日对应的 UTC 毫秒区间。
    ///
    /// # Logic
    /// 1. 按 `-` 切分，必须恰好得到年、月、日三个数字分量。
    /// 2. 分量必须构成真实存在的日期。
    /// 3. 本地 00:00:00 与 23:59:59 分别换算为 UTC 毫秒。
    ///
    /// # Arguments
    /// * `date`: 形如 `2025-10-01` 的本地日期。
    ///
    /// # Returns
    /// 成功返回当日的 `FetchRange`，格式不符返回 `MalformedDate`。
    pub fn day_bounds(&self, date: &str) -> Result<FetchRange, MarketError> {
        let day = parse_date(date)?;
        let start = self.local_ms(day.and_time(NaiveTime::MIN), date)?;
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59)
            .ok_or_else(|| MarketError::MalformedDate(date.to_string()))?;
        let end = self.local_ms(day.and_time(end_of_day), date)?;
        Ok(FetchRange::new(start, end))
    }

    /// # Summary
    /// 将客户端的时间范围描述解析为 UTC 毫秒区间。
    ///
    /// # Logic
    /// 1. 日期模式：起点取开始日期的本地零点；终点取结束日期 (缺省为开始日期) 的本地 23:59:59。
    /// 2. 时间戳模式：原样透传；缺省结束时间时取开始时间所在本地日的 23:59:59。
    ///
    /// # Returns
    /// 返回的区间允许 `start > end`，由调用方视为空结果。
    pub fn resolve(&self, input: &RangeInput) -> Result<FetchRange, MarketError> {
        match input {
            RangeInput::Dates { start, end } => {
                let first = self.day_bounds(start)?;
                let last = match end {
                    Some(end) => self.day_bounds(end)?,
                    None => first,
                };
                Ok(FetchRange::new(first.start_ms, last.end_ms))
            }
            RangeInput::Timestamps { start, end } => match end {
                Some(end) => Ok(FetchRange::new(*start, *end)),
                None => {
                    let local_day = DateTime::from_timestamp_millis(*start)
                        .ok_or_else(|| MarketError::MalformedDate(start.to_string()))?
                        .with_timezone(&self.offset)
                        .date_naive();
                    let day = self.day_bounds(&local_day.format("%Y-%m-%d").to_string())?;
                    Ok(FetchRange::new(*start, day.end_ms))
                }
            },
        }
    }

    fn local_ms(&self, local: NaiveDateTime, raw: &str) -> Result<i64, MarketError> {
        self.offset
            .from_local_datetime(&local)
            .single()
            .map(|dt| dt.timestamp_millis())
            .ok_or_else(|| MarketError::MalformedDate(raw.to_string()))
    }
}

fn parse_date(date: &str) -> Result<NaiveDate, MarketError> {
    let malformed = || MarketError::MalformedDate(date.to_string());
    let parts: Vec<&str> = date.trim().split('-').collect();
    let [year, month, day] = parts.as_slice() else {
        return Err(malformed());
    };
    let year: i32 = year.parse().map_err(|_| malformed())?;
    let month: u32 = month.parse().map_err(|_| malformed())?;
    let day: u32 = day.parse().map_err(|_| malformed())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(malformed)
}
