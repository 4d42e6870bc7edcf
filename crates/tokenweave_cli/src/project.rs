//! Project creation and scaffolding

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::{TokenweaveConfig, CONFIG_FILE};

/// Create a new Tokenweave project
pub fn create_project(path: &Path, name: &str) -> Result<()> {
    let config_path = path.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!("{} already exists", config_path.display());
    }

    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    // Create tokenweave.toml
    let config = TokenweaveConfig::new(name);
    fs::write(&config_path, config.to_toml()?)?;

    // Create the token source
    fs::write(path.join(&config.build.source), template_tokens())?;

    // Create .gitignore
    fs::write(
        path.join(".gitignore"),
        format!(
            r#"# Tokenweave build artifacts
/{}/
"#,
            config.build.output
        ),
    )?;

    // Create README
    fs::write(
        path.join("README.md"),
        format!(
            r#"# {}

Design tokens built with tokenweave.

## Build

```bash
tokenweave build
```

## Check contrast without writing artifacts

```bash
tokenweave check --strict
```

## Project Structure

```
{}/
├── tokenweave.toml  # Variants, layers and contrast pairs
├── tokens.json      # Token source
└── {}/              # Generated CSS and TypeScript
```
"#,
            name, name, config.build.output
        ),
    )?;

    Ok(())
}

fn template_tokens() -> &'static str {
    r##"{
  "color": {
    "$category": "color",
    "gray": {
      "50": "#f9fafb",
      "500": "#6b7280",
      "900": "#111827"
    },
    "brand": {
      "primary": { "value": "#1e66f5", "description": "Primary brand color" }
    },
    "background": {
      "primary": { "value": "{color.gray.50}", "type": "color" }
    },
    "text": {
      "primary": { "value": "{color.gray.900}", "type": "color" },
      "muted": "{color.gray.500}"
    }
  },
  "space": {
    "$category": "spacing",
    "sm": "8px",
    "md": "16px",
    "lg": "1.5rem"
  },
  "font": {
    "body": { "value": "Inter, system-ui, sans-serif", "type": "string" },
    "weight": { "regular": 400, "bold": 700 }
  },
  "opacity": {
    "muted": 0.6
  }
}
"##
}
