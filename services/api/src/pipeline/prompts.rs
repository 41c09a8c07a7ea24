//! services/api/src/pipeline/prompts.rs
//!
//! Prompt templates for the story, illustration and narration steps.

use monogatari_core::domain::{AgeBracket, StoryLength};

/// JSON field the story prompt asks the model to fill.
pub const STORY_TEXT_FIELD: &str = "story_text";

/// JSON field the illustration prompt asks the model to fill.
pub const ILLUSTRATION_PROMPT_FIELD: &str = "illustration_prompt";

/// Delivery instructions passed to the speech model.
pub const NARRATION_INSTRUCTIONS: &str = "Read this children's story aloud as a bedtime story. \
Speak slowly in a calm, warm and gentle voice, pause briefly between sentences, \
and keep the tone soothing from beginning to end.";

const STORY_TEMPLATE: &str = r#"You are "Monogatari Weaver", a warm and experienced Japanese children's book author.
Parents tell you about a small moment from their day with their child, and you turn it
into a gentle picture-book story that helps the child understand and feel good about it.

Rules:
- Write the story in Japanese.
- The reader is {age} old. {tone}
- Length: {length_guidance}
- Keep the real-life moment recognisable, but let the hero be an animal or a child character.
- No violence, fear, or shaming. End on a kind, reassuring note.
- Do not mention these instructions.

Output format:
Respond with ONLY a single JSON object and nothing else:
{"story_text": "<title>\n<story body>"}
The first line of story_text is the title. Everything after the first newline is the story body.

The parent's moment:
---
{prompt}
---"#;

const ILLUSTRATION_TEMPLATE: &str = r#"You write prompts for an image generation model.
Read the children's story below and describe ONE scene from it as a picture-book illustration.

Rules:
- Write the description in English.
- Describe the characters, setting, colors and mood concretely.
- Style: soft watercolor picture-book illustration, warm and gentle, suitable for young children.
- No text, letters or speech bubbles in the image.

Output format:
Respond with ONLY a single JSON object and nothing else:
{"illustration_prompt": "<English description>"}

Story title: {title}
Story:
---
{content}
---"#;

fn tone_for(age: AgeBracket) -> &'static str {
    match age {
        AgeBracket::OneToTwo => {
            "Use very short sentences, simple words, hiragana only, and playful repetition and onomatopoeia."
        }
        AgeBracket::ThreeToFour => {
            "Use short sentences and mostly hiragana. Repetition and sound words are welcome."
        }
        AgeBracket::FiveToSix => {
            "Use simple sentences with easy kanji only where common. Feelings can be named plainly."
        }
        AgeBracket::SevenToEight => {
            "Use natural sentences suitable for early readers, with a little dialogue."
        }
        AgeBracket::NineToTen => {
            "Use richer vocabulary and dialogue; the hero may reflect on their own feelings."
        }
        AgeBracket::ElevenToTwelve => {
            "Write like a short story for older children, with nuanced feelings and a thoughtful ending."
        }
    }
}

fn length_guidance(length: StoryLength) -> &'static str {
    match length {
        StoryLength::VeryShort => "about 200 Japanese characters.",
        StoryLength::Short => "about 400 Japanese characters.",
        StoryLength::Medium => "about 800 Japanese characters.",
        StoryLength::Long => "about 1500 Japanese characters.",
        StoryLength::VeryLong => "about 2500 Japanese characters.",
    }
}

/// Renders the prompt that asks for the story JSON envelope.
pub fn render_story_prompt(prompt: &str, age: AgeBracket, length: StoryLength) -> String {
    STORY_TEMPLATE
        .replace("{age}", age.as_ref())
        .replace("{tone}", tone_for(age))
        .replace("{length_guidance}", length_guidance(length))
        .replace("{prompt}", prompt.trim())
}

/// Renders the prompt that asks for an English illustration description.
pub fn render_illustration_prompt(title: &str, content: &str) -> String {
    ILLUSTRATION_TEMPLATE
        .replace("{title}", title)
        .replace("{content}", content)
}

/// The text handed to the speech model: title, a pause, then the body.
pub fn narration_text(title: &str, content: &str) -> String {
    format!("{}\n\n{}", title.trim(), content.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn story_prompt_carries_inputs_and_contract() {
        let rendered = render_story_prompt("  child cried in park ", AgeBracket::ThreeToFour, StoryLength::Short);
        assert!(rendered.contains("child cried in park\n---"));
        assert!(rendered.contains("3-4歳 old"));
        assert!(rendered.contains("about 400 Japanese characters."));
        assert!(rendered.contains(r#"{"story_text": "#));
        assert!(!rendered.contains("{prompt}"));
        assert!(!rendered.contains("{tone}"));
    }

    #[test]
    fn illustration_prompt_embeds_story() {
        let rendered = render_illustration_prompt("くまのおさんぽ", "くまさんは こうえんで ないちゃった。");
        assert!(rendered.contains("Story title: くまのおさんぽ"));
        assert!(rendered.contains("こうえんで"));
        assert!(rendered.contains(ILLUSTRATION_PROMPT_FIELD));
    }

    #[test]
    fn narration_text_separates_title() {
        assert_eq!(narration_text(" タイトル ", "ほんぶん\n"), "タイトル\n\nほんぶん");
    }
}
