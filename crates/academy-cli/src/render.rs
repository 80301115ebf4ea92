use shared::i18n::{Translator, keys};
use shared::llm::AiResponse;
use shared::posts::BlogPost;
use shared::simulations::simulation_route;

pub fn render_response(response: &AiResponse, translator: &dyn Translator) -> String {
    match response {
        AiResponse::Answer { text } => text.clone(),
        AiResponse::Recommendation {
            text,
            simulation_id,
        } => format!(
            "{text}\n\n  -> {}: {}",
            translator.t(keys::ASSISTANT_OPEN_SIMULATION),
            simulation_route(simulation_id)
        ),
        AiResponse::GeneratedExample { text, steps } => {
            let mut rendered = format!(
                "{text}\n\n{}:",
                translator.t(keys::ASSISTANT_EXAMPLE_HEADING)
            );
            for (index, step) in steps.iter().enumerate() {
                rendered.push_str(&format!(
                    "\n  {}. {}\n     {}",
                    index + 1,
                    step.title,
                    step.content
                ));
            }
            rendered
        }
    }
}

pub fn render_post_line(post: &BlogPost) -> String {
    let date = post
        .published_at_utc()
        .map(|published_at| published_at.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| post.published_at.clone());
    format!("{date}  {:<40}  {}", post.slug, post.title)
}
