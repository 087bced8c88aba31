//! Keybinding registry: maps keys to actions, with config overrides.
//!
//! Bindings are looked up per focus context first, then globally, so the
//! same key can mean different things in the recommendation and history
//! panels.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    NavDown,
    NavUp,
    CycleFocus,
    Dismiss,
    MarkRead,
    LoadMore,
    Reload,
    ClearHistory,
    ResetRecommendations,
    OpenInBrowser,
    CycleTheme,
    ShowHelp,
}

impl Action {
    /// Human-readable description for the help screen.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit",
            Self::NavDown => "Navigate down",
            Self::NavUp => "Navigate up",
            Self::CycleFocus => "Switch panel",
            Self::Dismiss => "Dismiss notification",
            Self::MarkRead => "Mark article as read",
            Self::LoadMore => "Load more (next page)",
            Self::Reload => "Reload recommendations",
            Self::ClearHistory => "Clear reading history",
            Self::ResetRecommendations => "Reset server recommendations",
            Self::OpenInBrowser => "Open article in browser",
            Self::CycleTheme => "Cycle theme",
            Self::ShowHelp => "Show help",
        }
    }
}

/// Parse an action name from the config `[keybindings]` table.
fn parse_action_name(name: &str) -> Option<Action> {
    match name.to_lowercase().as_str() {
        "quit" => Some(Action::Quit),
        "nav_down" | "down" => Some(Action::NavDown),
        "nav_up" | "up" => Some(Action::NavUp),
        "cycle_focus" | "tab" => Some(Action::CycleFocus),
        "dismiss" | "back" => Some(Action::Dismiss),
        "mark_read" | "read" => Some(Action::MarkRead),
        "load_more" | "next_page" => Some(Action::LoadMore),
        "reload" | "refresh" => Some(Action::Reload),
        "clear_history" => Some(Action::ClearHistory),
        "reset_recommendations" | "reset" => Some(Action::ResetRecommendations),
        "open_in_browser" | "open" => Some(Action::OpenInBrowser),
        "cycle_theme" | "theme" => Some(Action::CycleTheme),
        "show_help" | "help" => Some(Action::ShowHelp),
        _ => None,
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context. Determines which bindings are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    Recommendations,
    History,
}

// ============================================================================
// Key Specification
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn char(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }
}

/// Parse a key string from config into a KeySpec.
///
/// Supported: single chars ("q"), named keys ("Enter", "Esc", "Tab", "Up",
/// "Down", "Left", "Right", "Backspace", "Space"), "Ctrl+x", and "F1"-"F12".
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+") {
        let mut chars = rest.trim().chars();
        let c = chars.next()?;
        return chars.next().is_none().then(|| KeySpec::ctrl(c));
    }

    let named = match s.to_lowercase().as_str() {
        "enter" | "return" => Some(KeyCode::Enter),
        "esc" | "escape" => Some(KeyCode::Esc),
        "tab" => Some(KeyCode::Tab),
        "up" => Some(KeyCode::Up),
        "down" => Some(KeyCode::Down),
        "left" => Some(KeyCode::Left),
        "right" => Some(KeyCode::Right),
        "backspace" => Some(KeyCode::Backspace),
        "space" => Some(KeyCode::Char(' ')),
        _ => None,
    };
    if let Some(code) = named {
        return Some(KeySpec::plain(code));
    }

    if let Some(n) = s
        .strip_prefix(['F', 'f'])
        .and_then(|n| n.parse::<u8>().ok())
    {
        return (1..=12).contains(&n).then(|| KeySpec::plain(KeyCode::F(n)));
    }

    let mut chars = s.chars();
    let c = chars.next()?;
    chars.next().is_none().then(|| KeySpec::char(c))
}

/// Format a KeySpec for the help screen.
fn format_key(key: &KeySpec) -> String {
    let modifier = if key.modifiers.contains(KeyModifiers::CONTROL) {
        "Ctrl+"
    } else {
        ""
    };

    let name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => "?".to_string(),
    };

    format!("{}{}", modifier, name)
}

// ============================================================================
// Keybinding Registry
// ============================================================================

pub struct KeybindingRegistry {
    /// (Context, KeySpec) -> Action
    lookup: HashMap<(Context, KeySpec), Action>,
    /// Registration order, for the help screen
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::new(),
            bindings: Vec::new(),
        };
        registry.register_defaults();
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    fn register_defaults(&mut self) {
        use Context::{Global, Recommendations};

        self.bind(Global, KeySpec::char('q'), Action::Quit);
        self.bind(Global, KeySpec::char('j'), Action::NavDown);
        self.bind(Global, KeySpec::plain(KeyCode::Down), Action::NavDown);
        self.bind(Global, KeySpec::char('k'), Action::NavUp);
        self.bind(Global, KeySpec::plain(KeyCode::Up), Action::NavUp);
        self.bind(Global, KeySpec::plain(KeyCode::Tab), Action::CycleFocus);
        self.bind(Global, KeySpec::plain(KeyCode::Esc), Action::Dismiss);

        self.bind(Recommendations, KeySpec::char('m'), Action::MarkRead);
        self.bind(Recommendations, KeySpec::plain(KeyCode::Enter), Action::MarkRead);
        self.bind(Recommendations, KeySpec::char('o'), Action::OpenInBrowser);

        self.bind(Global, KeySpec::char('n'), Action::LoadMore);
        self.bind(Global, KeySpec::char('r'), Action::Reload);
        self.bind(Global, KeySpec::char('C'), Action::ClearHistory);
        self.bind(Global, KeySpec::char('R'), Action::ResetRecommendations);
        self.bind(Global, KeySpec::char('T'), Action::CycleTheme);
        self.bind(Global, KeySpec::char('?'), Action::ShowHelp);
    }

    /// Apply user overrides from the config `[keybindings]` table.
    ///
    /// The new key replaces every default binding of that action, in the
    /// same contexts. Returns warnings for unknown actions or unparseable keys.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        for (action_name, key_str) in overrides {
            let Some(action) = parse_action_name(action_name) else {
                warnings.push(format!("Unknown action '{}', ignoring", action_name));
                continue;
            };
            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{}' for action '{}', ignoring",
                    key_str, action_name
                ));
                continue;
            };

            let mut contexts: Vec<Context> = self
                .bindings
                .iter()
                .filter(|(_, _, a)| *a == action)
                .map(|(c, _, _)| *c)
                .collect();
            contexts.dedup();

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);
            for ctx in contexts {
                self.bind(ctx, key, action);
            }

            tracing::info!(action = %action_name, key = %key_str, "Applied keybinding override");
        }

        warnings
    }

    /// Look up the action for a key, trying `context` before Global.
    ///
    /// Terminals report `C` or `?` as the char plus SHIFT. The char already
    /// carries the shift, so SHIFT is dropped before the lookup.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        let modifiers = match code {
            KeyCode::Char(_) => modifiers.difference(KeyModifiers::SHIFT),
            _ => modifiers,
        };
        let key = KeySpec::new(code, modifiers);
        self.lookup
            .get(&(context, key))
            .or_else(|| self.lookup.get(&(Context::Global, key)))
            .copied()
    }

    /// All bindings as (context, key label, action, description).
    pub fn all_bindings(&self) -> Vec<(Context, String, Action, &'static str)> {
        self.bindings
            .iter()
            .map(|(ctx, key, action)| (*ctx, format_key(key), *action, action.describe()))
            .collect()
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_quit() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('q'), KeyModifiers::NONE, Context::Global),
            Some(Action::Quit)
        );
    }

    #[test]
    fn test_mark_read_only_in_recommendations() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Enter, KeyModifiers::NONE, Context::Recommendations),
            Some(Action::MarkRead)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('m'), KeyModifiers::NONE, Context::History),
            None
        );
    }

    #[test]
    fn test_context_falls_back_to_global() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('C'), KeyModifiers::NONE, Context::History),
            Some(Action::ClearHistory)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('n'), KeyModifiers::NONE, Context::Recommendations),
            Some(Action::LoadMore)
        );
    }

    #[test]
    fn test_shifted_chars_match_plain_bindings() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('C'), KeyModifiers::SHIFT, Context::Recommendations),
            Some(Action::ClearHistory)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('R'), KeyModifiers::SHIFT, Context::History),
            Some(Action::ResetRecommendations)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('?'), KeyModifiers::SHIFT, Context::Global),
            Some(Action::ShowHelp)
        );
        // Ctrl survives the normalization
        assert_eq!(
            reg.action_for_key(
                KeyCode::Char('C'),
                KeyModifiers::SHIFT | KeyModifiers::CONTROL,
                Context::Global
            ),
            None
        );
    }

    #[test]
    fn test_unknown_key_returns_none() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('z'), KeyModifiers::NONE, Context::Global),
            None
        );
    }

    #[test]
    fn test_apply_overrides_valid() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([("load_more".to_string(), "Ctrl+n".to_string())]);

        let warnings = reg.apply_overrides(&overrides);
        assert!(warnings.is_empty());
        assert_eq!(
            reg.action_for_key(KeyCode::Char('n'), KeyModifiers::NONE, Context::Global),
            None
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('n'), KeyModifiers::CONTROL, Context::Global),
            Some(Action::LoadMore)
        );
    }

    #[test]
    fn test_override_keeps_context() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([("mark_read".to_string(), "x".to_string())]);
        reg.apply_overrides(&overrides);

        assert_eq!(
            reg.action_for_key(KeyCode::Char('x'), KeyModifiers::NONE, Context::Recommendations),
            Some(Action::MarkRead)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('x'), KeyModifiers::NONE, Context::History),
            None
        );
        // Both default keys (m, Enter) are gone
        assert_eq!(
            reg.action_for_key(KeyCode::Enter, KeyModifiers::NONE, Context::Recommendations),
            None
        );
    }

    #[test]
    fn test_apply_overrides_warnings() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([
            ("fly".to_string(), "f".to_string()),
            ("quit".to_string(), "Ctrl+Alt+Q".to_string()),
        ]);
        let mut warnings = reg.apply_overrides(&overrides);
        warnings.sort();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("Cannot parse key"));
        assert!(warnings[1].contains("Unknown action"));
    }

    #[test]
    fn test_parse_key_string() {
        assert_eq!(parse_key_string("Enter"), Some(KeySpec::plain(KeyCode::Enter)));
        assert_eq!(parse_key_string("esc"), Some(KeySpec::plain(KeyCode::Esc)));
        assert_eq!(parse_key_string("F5"), Some(KeySpec::plain(KeyCode::F(5))));
        assert_eq!(parse_key_string("F13"), None);
        assert_eq!(parse_key_string("Ctrl+d"), Some(KeySpec::ctrl('d')));
        assert_eq!(parse_key_string("x"), Some(KeySpec::char('x')));
        assert_eq!(parse_key_string("F"), Some(KeySpec::char('F')));
        assert_eq!(parse_key_string("xyz"), None);
        assert_eq!(parse_key_string(""), None);
    }

    #[test]
    fn test_format_key() {
        assert_eq!(format_key(&KeySpec::ctrl('n')), "Ctrl+n");
        assert_eq!(format_key(&KeySpec::plain(KeyCode::Enter)), "Enter");
        assert_eq!(format_key(&KeySpec::char('C')), "C");
    }

    #[test]
    fn test_all_bindings_cover_every_action() {
        let reg = KeybindingRegistry::new();
        let bindings = reg.all_bindings();
        for action in [
            Action::Quit,
            Action::MarkRead,
            Action::LoadMore,
            Action::Reload,
            Action::ClearHistory,
            Action::ResetRecommendations,
            Action::OpenInBrowser,
            Action::ShowHelp,
        ] {
            assert!(bindings.iter().any(|(_, _, a, _)| *a == action));
        }
    }
}
