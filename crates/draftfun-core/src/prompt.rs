//! Prompt construction for game generation turns.
//!
//! `PromptBuilder::build` is a pure function: the same inputs always
//! produce byte-identical output. It performs no I/O and cannot fail.

use draftfun_types::llm::Message;
use draftfun_types::session::{RuntimeError, SessionMode};

/// System instruction for a fresh generation. Spells out the artifact
/// contract: one self-contained HTML document, no prose, no fences.
const NEW_GAME_SYSTEM: &str = "\
You are a visionary game developer, specialized in creating fully polished, \
production-ready browser games. Deliver a single, complete HTML document that \
can be dropped into an <iframe> and run immediately. Follow these rules:

1. Document structure: your output must start with <!DOCTYPE html> and include \
all HTML, CSS, and JavaScript in one file. You may only load external scripts \
from these CDNs: Three.js, GSAP, Matter.js, Pixi.js, or p5.js.
2. Assets: no external image URLs. All images must be embedded via Base64 data \
URIs or generated procedurally with JavaScript.
3. Performance: use requestAnimationFrame for smooth, high-performance updates. \
You may use localStorage to save game progress or settings.
4. Gameplay and UI: include responsive controls, intuitive menus, scoring, and \
a restart path after game over. If the game uses arrow keys, prevent the page \
from scrolling when they are pressed.
5. Output format: do not provide any explanations, markdown formatting, or code \
blocks. Only output the self-contained HTML file, starting with <!DOCTYPE html> \
and ending with </html>.";

/// Preamble for a revision turn.
const EDIT_PREAMBLE: &str = "\
Continuing from your previous response, you are still building a fully \
polished, self-contained HTML game. Apply the changes the user requests below, \
keeping the same constraints: a single complete HTML file starting with \
<!DOCTYPE html>, permitted CDNs only (Three.js, GSAP, Matter.js, Pixi.js, or \
p5.js), no external image links, requestAnimationFrame for animation, and no \
extra text, markdown, or code fences.";

/// Builds the outbound message list for one generation turn.
///
/// Stateless; the caller supplies the window snapshot and any pending
/// runtime error.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the messages for a turn.
    ///
    /// In `New` mode the window is ignored and a fixed system
    /// instruction plus the user's request is produced. In `Edit` mode
    /// the window snapshot is carried through verbatim and the user's
    /// delta request is appended, with any runtime error report placed
    /// ahead of the user's own text.
    pub fn build(
        mode: SessionMode,
        window: &[Message],
        raw_user_text: &str,
        runtime_error: Option<&RuntimeError>,
    ) -> Vec<Message> {
        match mode {
            SessionMode::New => vec![
                Message::system(NEW_GAME_SYSTEM),
                Message::user(format!(
                    "Do not respond with anything except valid HTML. Do not wrap \
                     it in a code block. Here is my request: {raw_user_text}"
                )),
            ],
            SessionMode::Edit => {
                let mut messages = window.to_vec();
                messages.push(Message::user(Self::edit_request(
                    raw_user_text,
                    runtime_error,
                )));
                messages
            }
        }
    }

    fn edit_request(raw_user_text: &str, runtime_error: Option<&RuntimeError>) -> String {
        let mut body = String::from(EDIT_PREAMBLE);
        body.push_str("\n\n");
        if let Some(error) = runtime_error {
            body.push_str("The current version throws a runtime error. Fix it \
                           before applying the request below.\n");
            body.push_str("Runtime error: ");
            body.push_str(&error.describe());
            body.push_str("\n\n");
        }
        body.push_str("User's updated request: ");
        body.push_str(raw_user_text);
        body
    }
}
