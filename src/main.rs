//! Console chat against a Wit.ai app
//!
//! Reads one utterance per line from stdin and prints the bot's messages.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use wit_converse::{ActionError, ActionRequest, ActionTable, BotReply, Context, Wit, WitConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = WitConfig::from_env();

    // Logs go to stderr so they don't interleave with the conversation
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let fmt_layer = if config.log_json {
        fmt_layer
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .boxed()
    } else {
        fmt_layer.boxed()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wit_converse=info".into()),
        )
        .with(fmt_layer)
        .init();

    let actions = ActionTable::builder()
        .function("send", send)
        .function("merge", merge_entities)
        .build()?;

    let wit = Wit::from_config(&config)?.with_actions(actions);

    tracing::info!(
        host = %config.api_host,
        version = %config.api_version,
        session_id = %config.session_id,
        max_steps = config.max_steps,
        "Starting interactive session"
    );

    wit.interactive(None, config.max_steps).await?;
    Ok(())
}

/// Messages are printed by the console loop; only quick replies need showing
fn send(request: ActionRequest, reply: Option<&BotReply>) -> Result<Option<Context>, ActionError> {
    if let Some(reply) = reply.filter(|r| !r.quick_replies.is_empty()) {
        eprintln!("  quick replies: {}", reply.quick_replies.join(" | "));
    }
    Ok(Some(request.context))
}

/// Copy the first value of each extracted entity into the context
fn merge_entities(
    request: ActionRequest,
    _reply: Option<&BotReply>,
) -> Result<Option<Context>, ActionError> {
    let mut context = request.context;
    for (name, values) in request.entities.iter().flatten() {
        if let Some(value) = values
            .as_array()
            .and_then(|v| v.first())
            .and_then(|first| first.get("value"))
        {
            context.insert(name.clone(), value.clone());
        }
    }
    Ok(Some(context))
}
