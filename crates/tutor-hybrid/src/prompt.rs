//! Prompt text handed to the generation service.

use tutor_core::levels::YearLevel;
use tutor_core::types::Excerpt;

use crate::activity::ActivityKind;

pub const NO_DATA_PLACEHOLDER: &str = "No curriculum data found, but I’ll provide a response!";
pub const FALLBACK_EXAMPLE: &str = "Here’s an example sentence for you!";
const FALLBACK_EXAMPLES: &[&str] = &[FALLBACK_EXAMPLE];

const CANNED_EXAMPLES: &[(&str, [&str; 3])] = &[
    ("Foundation", ["The sun is big and yellow!", "A bunny hops quickly.", "Flowers grow in soil!"]),
    ("Year 1", ["The moon shines at night.", "Fish swim in water.", "Trees grow tall!"]),
    ("Year 2", ["Stars shine in the sky!", "Frogs live near ponds.", "The sun helps plants grow!"]),
    ("Year 3", ["Rivers flow to the sea.", "Birds use wings to fly.", "Magnets attract metal!"]),
    ("Year 4", ["Volcanoes release lava!", "Fish live in oceans.", "Shadows change with the sun!"]),
    ("Year 5", ["Planets orbit the sun!", "Wind carries seeds.", "Light creates rainbows!"]),
    ("Year 6", ["Earth’s plates cause quakes!", "Clouds form rain.", "Electricity powers lights!"]),
    ("Year 7", ["Cells are life’s building blocks!", "Rocks reveal Earth’s past.", "Gravity keeps us grounded!"]),
    ("Year 8", ["Atoms form everything!", "Heat turns water to steam.", "Sound travels in waves!"]),
    ("Year 9", ["Stars explode in space!", "Chemicals react together.", "Forces affect motion!"]),
    ("Year 10", ["Genes control traits!", "Earth orbits the sun.", "Energy flows in circuits!"]),
];

/// Example sentences for a level label, or the single generic sentence when
/// the label has none.
pub fn canned_examples(level_label: &str) -> &'static [&'static str] {
    CANNED_EXAMPLES
        .iter()
        .find(|(label, _)| *label == level_label)
        .map_or(FALLBACK_EXAMPLES, |(_, examples)| examples.as_slice())
}

/// Excerpts as `Excerpt: ...` paragraphs, or the no-data placeholder.
pub fn render_context(excerpts: &[Excerpt]) -> String {
    if excerpts.is_empty() {
        return NO_DATA_PLACEHOLDER.to_string();
    }
    excerpts.iter().map(|e| format!("Excerpt: {}", e.text)).collect::<Vec<_>>().join("\n\n")
}

/// Lesson prompt grounded in retrieved curriculum excerpts.
pub fn grounded_prompt(area: &str, level: YearLevel, query: &str, excerpts: &[Excerpt]) -> String {
    let level = level.label();
    format!(
        "You are a professional tutor teaching {area} at {level}. The student asked: '{query}'. \
         Using this curriculum data as a guide, create an educational lesson aligned with the Victorian Curriculum F–10 Version 2.0. \
         Keep it 1-2 pages (300-500 words) on a single page. Start with foundational concepts, progress to {level} skills, \
         and include clear examples. Use emojis like 📖, ✅, 🔍, ✍️, 📝 for Foundation to Year 6, or fewer for higher levels:\n\n{}",
        render_context(excerpts)
    )
}

/// Lesson prompt for a query that does not fit the subject; it is seeded with
/// canned examples for the level instead of excerpts.
pub fn redirect_prompt(area: &str, level: YearLevel, query: &str) -> String {
    let level = level.label();
    let examples = canned_examples(&level).join(", ");
    format!(
        "You are a professional tutor teaching {area} at {level}. The student asked: '{query}'. \
         This query doesn’t align with {area}—it seems technical! Create an educational lesson aligned with the Victorian Curriculum F–10 Version 2.0, \
         1-2 pages (300-500 words) on a single page. Note it’s not part of {area}, then use these examples for {level} \
         and expand with clear, relevant content. Use emojis like 📖, ✅, 🔍, ✍️, 📝 for Foundation to Year 6, or fewer for higher levels:\n\n{examples}"
    )
}

pub fn fixed_prompt(kind: ActivityKind, level: YearLevel) -> String {
    let level = level.label();
    let context = format!("Create a {} activity for {level}", kind.name().to_lowercase());
    match kind {
        ActivityKind::Story => format!(
            "You are a professional tutor for {level}. Create a narrative activity aligned with the Victorian Curriculum F–10 Version 2.0 \
             that students at {level} can read. Keep it 1-2 pages (300-500 words) on a single page. Include a short story with a setting, \
             a challenge, and a resolution, using appropriate vocabulary. Use emojis like 📖, ✅, 🔍, ✍️, 📝, 🌳, 🐾 for Foundation to Year 6, \
             or fewer for higher levels:\n\n{context}"
        ),
        ActivityKind::Maths => format!(
            "You are a professional tutor for {level}. Create a 'Treasure Hunt Maths Activity' aligned with the Victorian Curriculum F–10 Version 2.0 \
             that matches {level} mathematics skills. Keep it 1-2 pages (300-500 words) on a single page. Include 5 sums with answers \
             (using addition, subtraction, or multiplication), a brief narrative about a 'Maths Explorer' solving them, and clear explanations. \
             Use emojis like 📏, ➕, 🔢, ✏️, 🧮, 🍎, ⭐ for Foundation to Year 6, or fewer for higher levels:\n\n{context}"
        ),
        ActivityKind::Science => format!(
            "You are a professional tutor for {level}. Create a science activity aligned with the Victorian Curriculum F–10 Version 2.0 \
             that matches {level} skills. Keep it 1-2 pages (300-500 words) on a single page. Include 5 questions with answers, \
             a brief narrative about a student investigating them, and clear explanations. \
             Use emojis like 🔬, 🌍, 💡, 🌱, ☀️, 🐾, ⚗️ for Foundation to Year 6, or fewer for higher levels:\n\n{context}"
        ),
    }
}
