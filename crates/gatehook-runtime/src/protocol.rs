//! One JSON object in on stdin, one JSON object out on stdout.

use std::io::Write;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::warn;

use crate::error::DispatchError;
use crate::hooks::{DispatchContext, EventType, HandlerRegistry, HookInput, HookOutput};

/// Read and parse the hook input. Empty or malformed input is protocol-fatal.
pub async fn read_input<R>(reader: &mut R) -> Result<HookInput, DispatchError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(serde_json::from_slice(&buf)?)
}

/// Serialise the output as a single line
pub fn write_output<W: Write>(writer: &mut W, output: &HookOutput) -> Result<()> {
    serde_json::to_writer(&mut *writer, output).context("Failed to serialise hook output")?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Read input, dispatch it, write the response; returns the process exit code.
///
/// The event comes from the caller (the subcommand); a different
/// `hook_event_name` in the payload is logged and ignored.
pub async fn run_hook<R, W>(
    registry: &HandlerRegistry,
    event: EventType,
    reader: &mut R,
    writer: &mut W,
) -> Result<i32>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    let input = read_input(reader).await?;
    if !input.hook_event_name.is_empty() && input.hook_event_name != event.as_str() {
        warn!(
            expected = %event,
            received = %input.hook_event_name,
            "hook_event_name does not match subcommand"
        );
    }

    let output = registry
        .dispatch(&DispatchContext::background(), event, &input)
        .await?;
    write_output(writer, &output)?;

    let code = output.exit_code();
    if code != 0 {
        // Exit code 2 feeds stderr back to the agent
        eprintln!("{}", output.reason().unwrap_or("rejected by gatehook"));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::SecurityHandler;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_read_input_rejects_garbage() {
        let mut reader: &[u8] = b"{not json";
        let err = read_input(&mut reader).await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidInput(_)));

        let mut empty: &[u8] = b"";
        assert!(read_input(&mut empty).await.is_err());
    }

    #[tokio::test]
    async fn test_run_hook_denies_with_exit_code_two() {
        let registry = HandlerRegistry::new();
        registry.register(Arc::new(SecurityHandler::with_defaults()));

        let mut reader: &[u8] =
            br#"{"session_id":"s","hook_event_name":"PreToolUse","tool_name":"Bash","tool_input":{"command":"rm -rf /"}}"#;
        let mut out = Vec::new();
        let code = run_hook(&registry, EventType::PreToolUse, &mut reader, &mut out)
            .await
            .unwrap();
        assert_eq!(code, 2);

        let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(v["hookSpecificOutput"]["permissionDecision"], "deny");
    }

    #[tokio::test]
    async fn test_run_hook_stop_writes_empty_object() {
        let registry = HandlerRegistry::new();
        let mut reader: &[u8] = br#"{"session_id":"s","hook_event_name":"Stop"}"#;
        let mut out = Vec::new();
        let code = run_hook(&registry, EventType::Stop, &mut reader, &mut out)
            .await
            .unwrap();
        assert_eq!(code, 0);
        assert_eq!(String::from_utf8(out).unwrap().trim(), "{}");
    }
}
