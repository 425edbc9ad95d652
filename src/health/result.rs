//! 健康检测结果数据结构
//!
//! 定义单次探测结果、失败连击记录与可序列化的错误封套

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::task::Execution;

/// 注册后、首次执行前占位结果的描述文本
pub(crate) const INITIAL_RESULT_MSG: &str = "didn't run yet";

/// 可序列化的错误封套
///
/// 探测失败在内存中以 `anyhow::Error` 表示；对外渲染时折叠为
/// 消息加可选因果链的形式。`Display` 输出即顶层消息。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckError {
    /// 错误消息
    pub message: String,
    /// 引发本错误的底层原因
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<CheckError>>,
}

impl CheckError {
    /// 从错误链构建封套，逐层展开因果
    pub fn from_error(err: &anyhow::Error) -> Self {
        fn nest<'a>(mut chain: impl Iterator<Item = &'a (dyn std::error::Error + 'static)>) -> Option<CheckError> {
            let head = chain.next()?;
            Some(CheckError {
                message: head.to_string(),
                cause: nest(chain).map(Box::new),
            })
        }

        nest(err.chain()).unwrap_or_else(|| CheckError {
            message: err.to_string(),
            cause: None,
        })
    }

    /// 仅含消息、无因果链的封套
    pub fn message(message: impl Into<String>) -> Self {
        CheckError {
            message: message.into(),
            cause: None,
        }
    }
}

impl std::fmt::Display for CheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CheckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_ref().map(|c| c.as_ref() as _)
    }
}

/// 单个检测的最近一次执行结果
///
/// 值类型：读取方拿到的永远是独立副本。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    /// 探测返回的详情载荷，可缺省
    #[serde(rename = "message", skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 最近一次执行的失败原因；执行成功时为 `None`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CheckError>,
    /// 最近一次执行开始的时刻（首次执行前为注册时刻）
    pub timestamp: DateTime<Utc>,
    /// 最近一次执行耗时，序列化为整数毫秒，为零时省略
    #[serde(
        with = "duration_millis",
        skip_serializing_if = "std::time::Duration::is_zero",
        default
    )]
    pub duration: Duration,
    /// 以本次执行结尾的连续失败次数；成功时归零
    pub contiguous_failures: u32,
    /// 当前失败连击中首次失败的时刻；成功时为 `None`
    pub time_of_first_failure: Option<DateTime<Utc>>,
    /// 注册时的占位结果标记，不参与连击计数
    #[serde(skip)]
    pub(crate) provisional: bool,
}

impl CheckResult {
    /// 判断结果是否健康
    pub fn is_healthy(&self) -> bool {
        self.error.is_none()
    }

    /// 构造注册时的占位结果
    ///
    /// `initially_passing` 为真时结果视为健康；否则携带合成错误，
    /// 连续失败次数记为 1。
    pub(crate) fn initial(now: DateTime<Utc>, initially_passing: bool) -> Self {
        let error = if initially_passing {
            None
        } else {
            Some(CheckError::message(INITIAL_RESULT_MSG))
        };
        CheckResult {
            details: Some(Value::String(INITIAL_RESULT_MSG.to_string())),
            contiguous_failures: if error.is_some() { 1 } else { 0 },
            time_of_first_failure: error.as_ref().map(|_| now),
            error,
            timestamp: now,
            duration: Duration::ZERO,
            provisional: true,
        }
    }

    /// 由一次真实执行推进结果，应用失败连击规则
    ///
    /// 占位结果不延续连击：首次真实失败从 1 重新计数，
    /// 并以本次执行时刻作为连击起点。
    pub(crate) fn from_execution(
        prev: Option<&CheckResult>,
        execution: Execution,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut result = CheckResult {
            details: execution.details,
            error: execution.error.as_ref().map(CheckError::from_error),
            timestamp,
            duration: execution.duration,
            contiguous_failures: 0,
            time_of_first_failure: None,
            provisional: false,
        };

        if !result.is_healthy() {
            match prev.filter(|p| !p.provisional) {
                Some(p) if !p.is_healthy() => {
                    result.contiguous_failures = p.contiguous_failures + 1;
                    result.time_of_first_failure = p.time_of_first_failure;
                }
                _ => {
                    result.contiguous_failures = 1;
                    result.time_of_first_failure = Some(timestamp);
                }
            }
        }

        result
    }
}

impl std::fmt::Display for CheckResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CheckResult{{details: {:?}, error: {:?}, time: {}, contiguousFailures: {}, timeOfFirstFailure: {:?}}}",
            self.details, self.error, self.timestamp, self.contiguous_failures, self.time_of_first_failure
        )
    }
}

/// Duration毫秒序列化模块
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use serde_json::json;

    fn execution(error: Option<anyhow::Error>) -> Execution {
        Execution {
            details: Some(json!("details")),
            duration: Duration::from_millis(5),
            error,
        }
    }

    #[test]
    fn test_initial_result_failing_by_default() {
        let now = Utc::now();
        let result = CheckResult::initial(now, false);

        assert!(!result.is_healthy());
        assert_eq!(result.details, Some(json!(INITIAL_RESULT_MSG)));
        assert_eq!(result.error.as_ref().unwrap().message, INITIAL_RESULT_MSG);
        assert_eq!(result.contiguous_failures, 1);
        assert_eq!(result.time_of_first_failure, Some(now));
        assert_eq!(result.duration, Duration::ZERO);
    }

    #[test]
    fn test_initial_result_initially_passing() {
        let result = CheckResult::initial(Utc::now(), true);

        assert!(result.is_healthy());
        assert_eq!(result.details, Some(json!(INITIAL_RESULT_MSG)));
        assert_eq!(result.contiguous_failures, 0);
        assert!(result.time_of_first_failure.is_none());
    }

    #[test]
    fn test_streak_ignores_provisional_result() {
        let registered_at = Utc::now();
        let initial = CheckResult::initial(registered_at, false);

        let first_failure_at = Utc::now();
        let first = CheckResult::from_execution(
            Some(&initial),
            execution(Some(anyhow!("failed"))),
            first_failure_at,
        );

        // 占位结果不计入连击，首次真实失败从1开始
        assert_eq!(first.contiguous_failures, 1);
        assert_eq!(first.time_of_first_failure, Some(first_failure_at));
    }

    #[test]
    fn test_streak_accumulates_and_preserves_first_failure_time() {
        let t1 = Utc::now();
        let first = CheckResult::from_execution(None, execution(Some(anyhow!("failed"))), t1);
        let second =
            CheckResult::from_execution(Some(&first), execution(Some(anyhow!("failed"))), Utc::now());
        let third =
            CheckResult::from_execution(Some(&second), execution(Some(anyhow!("failed"))), Utc::now());

        assert_eq!(first.contiguous_failures, 1);
        assert_eq!(second.contiguous_failures, 2);
        assert_eq!(third.contiguous_failures, 3);
        assert_eq!(second.time_of_first_failure, Some(t1));
        assert_eq!(third.time_of_first_failure, Some(t1));
    }

    #[test]
    fn test_success_resets_streak() {
        let first =
            CheckResult::from_execution(None, execution(Some(anyhow!("failed"))), Utc::now());
        let recovered = CheckResult::from_execution(Some(&first), execution(None), Utc::now());

        assert!(recovered.is_healthy());
        assert_eq!(recovered.contiguous_failures, 0);
        assert!(recovered.time_of_first_failure.is_none());
    }

    #[test]
    fn test_healthy_invariant() {
        // error缺省 ⇔ 连击为零 ⇔ 首次失败时间缺省
        for result in [
            CheckResult::initial(Utc::now(), true),
            CheckResult::initial(Utc::now(), false),
            CheckResult::from_execution(None, execution(None), Utc::now()),
            CheckResult::from_execution(None, execution(Some(anyhow!("failed"))), Utc::now()),
        ] {
            assert_eq!(result.is_healthy(), result.contiguous_failures == 0);
            assert_eq!(result.is_healthy(), result.time_of_first_failure.is_none());
        }
    }

    #[test]
    fn test_error_envelope_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let err = anyhow::Error::from(io).context("dial failed");
        let envelope = CheckError::from_error(&err);

        assert_eq!(envelope.message, "dial failed");
        assert_eq!(envelope.to_string(), "dial failed");
        let cause = envelope.cause.as_ref().expect("cause");
        assert_eq!(cause.message, "connection refused");
        assert!(cause.cause.is_none());
    }

    #[test]
    fn test_serialization_shape() {
        let t = Utc::now();
        let failing = CheckResult::from_execution(
            None,
            Execution {
                details: Some(json!("failed; i=1")),
                duration: Duration::from_millis(12),
                error: Some(anyhow!("failed")),
            },
            t,
        );

        let value = serde_json::to_value(&failing).unwrap();
        assert_eq!(value["message"], json!("failed; i=1"));
        assert_eq!(value["error"]["message"], json!("failed"));
        assert_eq!(value["duration"], json!(12));
        assert_eq!(value["contiguousFailures"], json!(1));
        assert!(value["timeOfFirstFailure"].is_string());
        let rendered_timestamp = value["timestamp"].as_str().expect("timestamp string");
        let parsed: DateTime<Utc> = rendered_timestamp.parse().unwrap();
        assert_eq!(parsed, t);
    }

    #[test]
    fn test_serialization_omits_zero_duration_and_absent_fields() {
        let healthy = CheckResult::from_execution(
            None,
            Execution {
                details: None,
                duration: Duration::ZERO,
                error: None,
            },
            Utc::now(),
        );

        let value = serde_json::to_value(&healthy).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("message"));
        assert!(!object.contains_key("error"));
        assert!(!object.contains_key("duration"));
        // 无失败连击时该字段序列化为null而非省略
        assert!(object.contains_key("timeOfFirstFailure"));
        assert_eq!(value["timeOfFirstFailure"], Value::Null);
    }

    #[test]
    fn test_result_roundtrip() {
        let original = CheckResult::from_execution(
            None,
            Execution {
                details: Some(json!({"url": "http://example.com"})),
                duration: Duration::from_millis(42),
                error: Some(anyhow!("boom")),
            },
            Utc::now(),
        );

        let json = serde_json::to_string(&original).unwrap();
        let parsed: CheckResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.details, original.details);
        assert_eq!(parsed.error, original.error);
        assert_eq!(parsed.duration, original.duration);
        assert_eq!(parsed.contiguous_failures, original.contiguous_failures);
    }
}
