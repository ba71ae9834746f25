//! `teamkb ask` — Ask the assistant a single question.

use teamkb_core::AssistantResponse;
use teamkb_gateway::AppState;

pub async fn run(
    query: String,
    cursor: Option<String>,
    history: Vec<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let state = AppState::from_config(&config).await?;

    let outcome = state
        .orchestrator
        .handle(&query, &history, cursor.as_deref())
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.response)?);
    } else {
        print!("{}", render(&outcome.response));
    }

    if outcome.is_internal_error() {
        return Err("The assistant pipeline failed; see the log above.".into());
    }
    Ok(())
}

fn render(response: &AssistantResponse) -> String {
    let mut out = format!("{}\n", response.answer);
    if !response.citations.is_empty() {
        out.push_str("\nSources:\n");
        for citation in &response.citations {
            out.push_str(&format!("  - {citation}\n"));
        }
    }
    out.push_str(&format!("\n💡 {}\n", response.follow_up));
    if let Some(cursor) = &response.next_cursor {
        out.push_str(&format!("   More results: teamkb ask \"more\" --cursor {cursor}\n"));
    }
    out
}
