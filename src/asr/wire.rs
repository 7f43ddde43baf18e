//! Wire-level transcript event parsing
//!
//! Frames are JSON objects of the form
//! `{"action": "started" | "result" | "error" | "end", "data": ...}`.
//! For `result` frames the `data` field is itself a JSON document carrying
//! the cumulative text in a nested word-by-word structure; everything
//! beyond "extract the text" is treated as opaque.

use serde::Deserialize;

use super::TranscriptEvent;

/// Outer event envelope
#[derive(Deserialize)]
struct WireEvent {
    action: Option<String>,
    data: Option<String>,
    desc: Option<String>,
    code: Option<String>,
}

/// Nested transcript payload: `cn.st.rt[].ws[].cw[].w`
#[derive(Deserialize)]
struct ResultData {
    cn: ResultCn,
}

#[derive(Deserialize)]
struct ResultCn {
    st: ResultSt,
}

#[derive(Deserialize)]
struct ResultSt {
    #[serde(default)]
    rt: Vec<ResultRt>,
}

#[derive(Deserialize)]
struct ResultRt {
    #[serde(default)]
    ws: Vec<ResultWs>,
}

#[derive(Deserialize)]
struct ResultWs {
    #[serde(default)]
    cw: Vec<ResultCw>,
}

#[derive(Deserialize)]
struct ResultCw {
    #[serde(default)]
    w: String,
}

/// Parse one wire frame into a transcript event
///
/// Returns `None` for frames that carry no event (unknown actions,
/// unparsable JSON); these are logged and skipped by the receive loop.
#[must_use]
pub fn parse_event(raw: &str) -> Option<TranscriptEvent> {
    let event: WireEvent = match serde_json::from_str(raw) {
        Ok(e) => e,
        Err(e) => {
            tracing::debug!(error = %e, "unparsable transcript frame");
            return None;
        }
    };

    match event.action.as_deref() {
        Some("started") => Some(TranscriptEvent::Started),
        Some("result") => {
            let data = event.data.unwrap_or_default();
            Some(TranscriptEvent::Partial(extract_text(&data)))
        }
        Some("end") => Some(TranscriptEvent::Ended),
        Some("error") => {
            let message = event
                .desc
                .or(event.code)
                .unwrap_or_else(|| "unknown error".to_string());
            Some(TranscriptEvent::Error(message))
        }
        other => {
            tracing::debug!(action = ?other, "ignoring transcript frame");
            None
        }
    }
}

/// Extract the cumulative text from a `result` payload
///
/// Falls back to the raw payload when it is not the expected nested JSON,
/// matching the upstream demo client's behavior.
fn extract_text(data: &str) -> String {
    serde_json::from_str::<ResultData>(data).map_or_else(
        |_| data.trim().to_string(),
        |parsed| {
            let mut text = String::new();
            for rt in &parsed.cn.st.rt {
                for ws in &rt.ws {
                    for cw in &ws.cw {
                        text.push_str(&cw.w);
                    }
                }
            }
            text.trim().to_string()
        },
    )
}
