use std::time::{Duration, SystemTime};

use ::http::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde_json::Value;

use crate::client::ClientInner;
use crate::error::Error;

pub(super) fn transform_model_name(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

pub(super) fn build_model_method_url(inner: &ClientInner, model: &str, method: &str) -> String {
    let model = transform_model_name(model);
    let base = &inner.api_client.base_url;
    let version = &inner.api_client.api_version;
    format!("{base}{version}/{model}:{method}")
}

/// 服务端建议等待时间的上限。
pub(super) const MAX_RETRY_DELAY: Duration = Duration::from_secs(60 * 60);

/// 将非 2xx 响应映射为带类型的错误。
pub(super) fn classify_error_response(status: StatusCode, headers: &HeaderMap, body: String) -> Error {
    let parsed = serde_json::from_str::<Value>(&body).ok();
    let api_message = parsed
        .as_ref()
        .and_then(|value| value.pointer("/error/message"))
        .and_then(Value::as_str)
        .map(ToString::to_string);

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = headers
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| parse_retry_after(value, SystemTime::now()))
            .or_else(|| parsed.as_ref().and_then(retry_delay_from_body));
        return Error::RateLimited {
            message: api_message.unwrap_or(body),
            retry_after,
        };
    }

    if is_credential_failure(status, &body) {
        return Error::Auth {
            message: api_message.unwrap_or(body),
        };
    }

    Error::ApiError {
        status: status.as_u16(),
        message: body,
    }
}

fn is_credential_failure(status: StatusCode, body: &str) -> bool {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => true,
        StatusCode::BAD_REQUEST => {
            body.contains("API_KEY_INVALID") || body.contains("API key not valid")
        }
        _ => false,
    }
}

/// `Retry-After` 既可以是秒数也可以是 HTTP 日期，结果不超过 [`MAX_RETRY_DELAY`]。
pub(super) fn parse_retry_after(value: &str, now: SystemTime) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs).min(MAX_RETRY_DELAY));
    }
    let at = httpdate::parse_http_date(value).ok()?;
    Some(
        at.duration_since(now)
            .unwrap_or(Duration::ZERO)
            .min(MAX_RETRY_DELAY),
    )
}

/// `google.rpc.RetryInfo` 里的 `retryDelay`，形如 `"37s"` 或 `"1.5s"`。
fn retry_delay_from_body(value: &Value) -> Option<Duration> {
    value
        .pointer("/error/details")?
        .as_array()?
        .iter()
        .filter_map(|detail| detail.get("retryDelay").and_then(Value::as_str))
        .find_map(|delay| {
            delay
                .trim()
                .strip_suffix('s')
                .and_then(|secs| secs.parse::<f64>().ok())
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(|secs| Duration::from_secs_f64(secs.min(MAX_RETRY_DELAY.as_secs_f64())))
        })
}
