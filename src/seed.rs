use crate::{domain::MemeRepository, errors::RepoError, models::NewMemeTemplate};

/// Templates every fresh installation starts with.
pub fn default_templates() -> Vec<NewMemeTemplate> {
    (1..=2)
        .map(|n| NewMemeTemplate {
            name: format!("Template {}", n),
            image_url: format!("https://example.com/template{}.png", n),
            default_top_text: format!("Default Top Text {}", n),
            default_bottom_text: format!("Default Bottom Text {}", n),
        })
        .collect()
}

/// Inserts each default template that is not stored yet. Safe to run repeatedly.
/// Returns how many templates were created.
pub async fn populate_templates(repo: &dyn MemeRepository) -> Result<usize, RepoError> {
    let mut created = 0;
    for template in default_templates() {
        let (stored, inserted) = repo.get_or_create_template(template).await?;
        if inserted {
            tracing::info!(template_id = stored.id, name = %stored.name, "Seeded meme template");
            created += 1;
        } else {
            tracing::debug!(template_id = stored.id, name = %stored.name, "Meme template already present");
        }
    }
    Ok(created)
}
