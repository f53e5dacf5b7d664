/// Fills the fixed encouragement template with the caller's emotion label.
/// The label is inserted verbatim.
pub fn build_prompt(emotion: &str) -> String {
    format!(
        "The user looks {emotion}.\n\
         Write a friendly, motivational, fun, and encouraging response in 3–5 lines.\n\
         Avoid generic advice; keep it light, warm, and engaging."
    )
}
