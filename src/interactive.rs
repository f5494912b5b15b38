//! Line-oriented console chat
//!
//! Each input line is one turn. Bot messages are printed in order and the
//! resulting context is carried into the next turn. End of input ends the
//! session cleanly.

use crate::action_loop::ActionLoop;
use crate::actions::ActionTable;
use crate::converse::{Context, ConverseClient};
use crate::error::WitError;
use crate::session::SessionRegistry;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Settings for one console session
#[derive(Debug, Clone)]
pub struct ConsoleOptions<'a> {
    pub session_id: &'a str,
    pub max_steps: u32,
}

/// Run turns for every line of `input` until it is exhausted.
///
/// A failed turn is reported on `output` and the previous context is kept.
/// Returns the context after the last successful turn.
pub async fn run_console<C, R, I, O>(
    client: &C,
    actions: &ActionTable,
    registry: &R,
    options: ConsoleOptions<'_>,
    context: Option<Context>,
    input: I,
    output: &mut O,
) -> Result<Context, WitError>
where
    C: ConverseClient + ?Sized,
    R: SessionRegistry + ?Sized,
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    if options.max_steps == 0 {
        return Err(WitError::Configuration(
            "max_steps must be at least 1".to_string(),
        ));
    }

    let action_loop = ActionLoop::new(client, actions, registry);
    let mut context = context.unwrap_or_default();
    let mut lines = input.lines();

    // `next_line` strips the terminator; the rest goes to the service as typed
    while let Some(line) = lines.next_line().await? {
        match action_loop
            .run(
                options.session_id,
                Some(&line),
                Some(context.clone()),
                options.max_steps,
            )
            .await
        {
            Ok(response) => {
                context = response.context;
                for msg in &response.messages {
                    output.write_all(msg.as_bytes()).await?;
                    output.write_all(b"\n").await?;
                }
            }
            Err(e) => {
                output.write_all(format!("error: {e}\n").as_bytes()).await?;
            }
        }
        output.flush().await?;
    }

    tracing::debug!(session_id = options.session_id, "Console input closed");
    Ok(context)
}
