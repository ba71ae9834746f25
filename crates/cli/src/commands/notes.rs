//! `teamkb notes` — Note management commands.

use teamkb_core::{Note, NoteDraft};

async fn open_store() -> Result<std::sync::Arc<dyn teamkb_core::NoteStore>, Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    Ok(teamkb_store::open_from_config(&config.store).await?)
}

pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store().await?;
    let notes = store.list_all_notes().await?;

    if notes.is_empty() {
        println!("   No notes yet. Add one with `teamkb notes add --title ...`");
        return Ok(());
    }

    println!("📝 {} note(s)", notes.len());
    for note in &notes {
        println!("{}", summary_line(note));
    }
    Ok(())
}

pub async fn add(title: String, content: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store().await?;
    let note = store.create(NoteDraft::new(title, content)).await?;
    println!("✅ Created note {}", note.id);
    Ok(())
}

pub async fn delete(id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store().await?;
    if store.delete(id).await? {
        println!("✅ Deleted note {id}");
        Ok(())
    } else {
        Err(format!("Note {id} not found").into())
    }
}

fn summary_line(note: &Note) -> String {
    let title = note.title.as_deref().unwrap_or("(untitled)");
    let preview: String = note
        .content
        .as_deref()
        .unwrap_or("")
        .chars()
        .take(60)
        .collect();
    format!(
        "  {:>4}  {}  {title}  {preview}",
        note.id,
        note.created_at.format("%Y-%m-%d %H:%M")
    )
}
