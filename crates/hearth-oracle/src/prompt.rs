//! Prompt template loading and rendering via `minijinja`.
//!
//! Templates are loaded from the filesystem (default: `templates/`) so the
//! prompts can be tuned without recompiling. Three files are required:
//! `system.j2` (shared framing), `strategic.j2` (pick a goal) and
//! `tactical.j2` (turn a goal into steps).
//!
//! Every template renders against the serialized [`WorldSnapshot`] plus a
//! few derived fields: qualitative stat `levels`, `campfire_available`, and
//! for tactical prompts the `goal` being planned.

use minijinja::Environment;
use serde_json::Value;

use hearth_types::{BuildingKind, StrategicGoal, WorldSnapshot};

use crate::error::LlmError;

const TEMPLATES: [&str; 3] = ["system", "strategic", "tactical"];

/// Manages prompt template loading and rendering.
pub struct PromptEngine {
    env: Environment<'static>,
}

/// The complete rendered prompt ready to send to an LLM backend.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    /// System message.
    pub system: String,
    /// User message with the situation and the answer format.
    pub user: String,
}

impl PromptEngine {
    /// Load every template from `templates_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Template`] if a file is missing or does not
    /// compile.
    pub fn new(templates_dir: &str) -> Result<Self, LlmError> {
        let mut env = Environment::new();
        for name in TEMPLATES {
            let source = load_template(templates_dir, &format!("{name}.j2"))?;
            env.add_template_owned(name, source)
                .map_err(|e| LlmError::Template(format!("failed to add {name} template: {e}")))?;
        }
        Ok(Self { env })
    }

    /// Prompt asking for a strategic goal.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] if the snapshot cannot be serialized or a
    /// template fails to render.
    pub fn render_strategic(&self, snapshot: &WorldSnapshot) -> Result<RenderedPrompt, LlmError> {
        let ctx = prompt_context(snapshot, None)?;
        self.render("strategic", &ctx)
    }

    /// Prompt asking for the steps that achieve `goal`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] if the snapshot cannot be serialized or a
    /// template fails to render.
    pub fn render_tactical(
        &self,
        snapshot: &WorldSnapshot,
        goal: &StrategicGoal,
    ) -> Result<RenderedPrompt, LlmError> {
        let ctx = prompt_context(snapshot, Some(goal))?;
        self.render("tactical", &ctx)
    }

    fn render(&self, user_template: &str, ctx: &Value) -> Result<RenderedPrompt, LlmError> {
        Ok(RenderedPrompt {
            system: self.render_one("system", ctx)?,
            user: self.render_one(user_template, ctx)?,
        })
    }

    fn render_one(&self, name: &str, ctx: &Value) -> Result<String, LlmError> {
        self.env
            .get_template(name)
            .map_err(|e| LlmError::Template(format!("missing {name} template: {e}")))?
            .render(ctx)
            .map_err(|e| LlmError::Template(format!("{name} render failed: {e}")))
    }
}

/// Coarse label for a 0-100 stat.
fn level(value: f64) -> &'static str {
    if value <= 0.0 {
        "Empty"
    } else if value < 10.0 {
        "Low"
    } else if value < 50.0 {
        "Medium"
    } else {
        "High"
    }
}

fn prompt_context(
    snapshot: &WorldSnapshot,
    goal: Option<&StrategicGoal>,
) -> Result<Value, LlmError> {
    let mut ctx = serde_json::to_value(snapshot)?;
    let vitals = snapshot.self_view.vitals;
    let campfire_available = snapshot
        .buildings
        .iter()
        .any(|b| b.kind == BuildingKind::Campfire);

    if let Some(map) = ctx.as_object_mut() {
        map.insert(
            "levels".to_owned(),
            serde_json::json!({
                "food": level(vitals.food),
                "warmth": level(vitals.warmth),
                "health": level(vitals.health),
                "energy": level(vitals.energy),
            }),
        );
        map.insert(
            "campfire_available".to_owned(),
            Value::Bool(campfire_available),
        );
        if let Some(goal) = goal {
            map.insert("goal".to_owned(), serde_json::to_value(goal)?);
        }
    }
    Ok(ctx)
}

/// Read a template file from disk.
fn load_template(dir: &str, filename: &str) -> Result<String, LlmError> {
    let path = format!("{dir}/{filename}");
    std::fs::read_to_string(&path)
        .map_err(|e| LlmError::Template(format!("failed to read {path}: {e}")))
}
