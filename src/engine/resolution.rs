// ==========================================
// 设备维修工单系统 - 解决耗时计算
// ==========================================
// 职责: 报修时间与关单时间之间的耗时计算与人读渲染
// 约束: 纯函数, 不访问数据库
// ==========================================

use chrono::NaiveDateTime;
use thiserror::Error;

/// 解决耗时计算错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionTimeError {
    /// 关单时间早于报修时间属于数据错误, 拒绝而非钳制为零
    #[error("关单时间早于报修时间: report_date={report_date}, close_time={close_time}")]
    CloseBeforeReport {
        report_date: NaiveDateTime,
        close_time: NaiveDateTime,
    },
}

/// 计算解决耗时 (整分钟, 向零截断)
///
/// # 参数
/// - report_date: 报修时间
/// - close_time: 关单时间
///
/// # 返回
/// - Ok(i64): floor((close_time - report_date) 秒数 / 60)
/// - Err(CloseBeforeReport): close_time < report_date
pub fn compute_resolution_minutes(
    report_date: NaiveDateTime,
    close_time: NaiveDateTime,
) -> Result<i64, ResolutionTimeError> {
    if close_time < report_date {
        return Err(ResolutionTimeError::CloseBeforeReport {
            report_date,
            close_time,
        });
    }

    Ok((close_time - report_date).num_seconds() / 60)
}

/// 渲染耗时为 "{d}d {h}h {m}m" 形式
///
/// 为零的分量省略; 整体为零时始终显示 "0m"
///
/// # 示例
/// - 150 → "2h 30m"
/// - 1470 → "1d 30m"
/// - 0 → "0m"
pub fn format_resolution_minutes(total_minutes: i64) -> String {
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes % (24 * 60)) / 60;
    let mins = total_minutes % 60;

    let mut out = String::new();
    if days > 0 {
        out.push_str(&format!("{}d ", days));
    }
    if hours > 0 {
        out.push_str(&format!("{}h ", hours));
    }
    if mins > 0 || out.is_empty() {
        out.push_str(&format!("{}m", mins));
    }

    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_compute_two_and_half_hours() {
        // 2024-01-01T00:00 → 2024-01-01T02:30 = 150 分钟
        assert_eq!(compute_resolution_minutes(dt(0, 0), dt(2, 30)), Ok(150));
    }

    #[test]
    fn test_compute_truncates_toward_zero() {
        let report = dt(0, 0);
        let close = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 1, 59)
            .unwrap();
        assert_eq!(compute_resolution_minutes(report, close), Ok(1));
    }

    #[test]
    fn test_compute_zero_duration() {
        assert_eq!(compute_resolution_minutes(dt(8, 0), dt(8, 0)), Ok(0));
    }

    #[test]
    fn test_compute_rejects_close_before_report() {
        let err = compute_resolution_minutes(dt(2, 30), dt(0, 0)).unwrap_err();
        assert!(matches!(err, ResolutionTimeError::CloseBeforeReport { .. }));
    }

    #[test]
    fn test_format_examples() {
        assert_eq!(format_resolution_minutes(150), "2h 30m");
        assert_eq!(format_resolution_minutes(0), "0m");
        assert_eq!(format_resolution_minutes(45), "45m");
        assert_eq!(format_resolution_minutes(60), "1h");
        // 为零的中间分量同样省略
        assert_eq!(format_resolution_minutes(24 * 60 + 30), "1d 30m");
        assert_eq!(format_resolution_minutes(2 * 24 * 60), "2d");
        assert_eq!(format_resolution_minutes(3 * 24 * 60 + 2 * 60 + 5), "3d 2h 5m");
    }
}
