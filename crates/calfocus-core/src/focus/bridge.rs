//! Line-delimited JSON bridge for browser native messaging hosts.
//!
//! Each request line is `{"cmd":"on"|"off","focusName":"Work"}`; each gets
//! exactly one reply line, `{"ok":true}` when the actuator succeeded and
//! `{"ok":false}` otherwise (including unparseable requests).

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use super::actuator::{Actuator, FocusCommand};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeRequest {
    pub cmd: String,
    #[serde(default)]
    pub focus_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BridgeReply {
    pub ok: bool,
}

/// Handle one request line.
pub async fn handle_line(line: &str, actuator: &dyn Actuator, default_focus_name: &str) -> BridgeReply {
    let request: BridgeRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            debug!(error = %e, "unparseable bridge request");
            return BridgeReply { ok: false };
        }
    };

    let command = match request.cmd.as_str() {
        "on" => FocusCommand::On,
        "off" => FocusCommand::Off,
        other => {
            debug!(cmd = other, "unknown bridge command");
            return BridgeReply { ok: false };
        }
    };

    let focus_name = request
        .focus_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(default_focus_name);

    match actuator.set_focus(command, focus_name).await {
        Ok(()) => BridgeReply { ok: true },
        Err(e) => {
            warn!(error = %e, %command, "bridge actuation failed");
            BridgeReply { ok: false }
        }
    }
}

/// Serve requests from `reader` until EOF, replying on `writer`.
pub async fn serve<R, W>(
    reader: R,
    mut writer: W,
    actuator: &dyn Actuator,
    default_focus_name: &str,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = handle_line(&line, actuator, default_focus_name).await;
        let mut out = serde_json::to_string(&reply)?;
        out.push('\n');
        writer.write_all(out.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActuatorError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        fail: bool,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Actuator for Recorder {
        async fn set_focus(&self, command: FocusCommand, focus_name: &str) -> Result<(), ActuatorError> {
            self.calls
                .lock()
                .unwrap()
                .push(command.shortcut_name(focus_name));
            if self.fail {
                Err(ActuatorError::Failed("boom".into()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn replies_once_per_line() {
        let actuator = Recorder::default();
        let input = b"{\"cmd\":\"on\",\"focusName\":\"Deep\"}\n\nnot json\n{\"cmd\":\"off\"}\n{\"cmd\":\"toggle\"}\n";
        let mut output = Vec::new();

        serve(&input[..], &mut output, &actuator, "Work").await.unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "{\"ok\":true}\n{\"ok\":false}\n{\"ok\":true}\n{\"ok\":false}\n"
        );
        assert_eq!(
            *actuator.calls.lock().unwrap(),
            vec!["Enable Deep Focus".to_string(), "Disable Work Focus".to_string()]
        );
    }

    #[tokio::test]
    async fn actuator_failure_replies_not_ok() {
        let actuator = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let reply = handle_line(r#"{"cmd":"on","focusName":"  "}"#, &actuator, "Work").await;
        assert!(!reply.ok);
        assert_eq!(*actuator.calls.lock().unwrap(), vec!["Enable Work Focus".to_string()]);
    }
}
