//! `package.json` for the bundle.

use crate::config::ValidatedConfig;
use serde_json::{Value, json};

/// Electron release the bundle is built against.
pub const ELECTRON_VERSION: &str = "^33.2.0";
pub const ELECTRON_BUILDER_VERSION: &str = "^25.1.8";

/// Three-part version accepted by npm, from a free-form version string.
pub fn npm_version(version: &str) -> String {
    let parts: Vec<u64> = version
        .trim()
        .split(['.', '-', '+'])
        .take(3)
        .map(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().unwrap_or(0)
        })
        .collect();
    let mut padded = [0u64; 3];
    for (slot, part) in padded.iter_mut().zip(parts) {
        *slot = part;
    }
    format!("{}.{}.{}", padded[0], padded[1], padded[2])
}

/// Manifest building a portable Windows executable that runs without elevation
/// and ships `resources/` next to it.
pub fn package_manifest(config: &ValidatedConfig) -> Value {
    let identifier = config.identifier();
    json!({
        "name": identifier,
        "version": npm_version(&config.app_version),
        "description": config.app_name,
        "author": config.publisher,
        "private": true,
        "main": "main.js",
        "scripts": {
            "start": "electron .",
            "dist": "electron-builder --win portable --x64"
        },
        "devDependencies": {
            "electron": ELECTRON_VERSION,
            "electron-builder": ELECTRON_BUILDER_VERSION
        },
        "build": {
            "appId": format!("com.installergenie.{identifier}"),
            "productName": config.app_name,
            "files": ["main.js", "preload.js", "index.html"],
            "extraResources": [
                { "from": "resources", "to": ".", "filter": ["**/*"] }
            ],
            "win": {
                "target": [{ "target": "portable", "arch": ["x64"] }],
                "requestedExecutionLevel": "asInvoker"
            },
            "portable": {
                "artifactName": format!("{identifier}-portable.exe")
            }
        }
    })
}
