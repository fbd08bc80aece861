#![forbid(unsafe_code)]

//! Declarative application setup.
//!
//! A [`FeelConfig`] describes the store settings and the initial route
//! table. JSON loading is always available; TOML loading needs the `config`
//! feature.
//!
//! ```toml
//! [store]
//! unsubscribe_policy = "any-position"
//!
//! [router]
//! home_path = "/"
//!
//! [[router.routes]]
//! pathname = "/"
//! components = [{ tag = "h1", text = "Home" }]
//! ```
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Malformed document | syntax error, unknown key, wrong type | `FeelError::Config` with the parser message |
//! | Bad style value | non-string, non-number style in a component | `InvalidArgumentType` when routes are built |

use feel_core::{FeelError, Result};
use feel_dom::ElementSpec;
use serde::{Deserialize, Serialize};

use crate::router::{DEFAULT_HOME_PATH, Route};
use crate::state::StoreConfig;

fn default_home_path() -> String {
    DEFAULT_HOME_PATH.to_owned()
}

fn parse_json<T: for<'de> Deserialize<'de>>(source: &str) -> Result<T> {
    serde_json::from_str(source).map_err(|err| FeelError::Config(err.to_string()))
}

#[cfg(feature = "config")]
fn parse_toml<T: for<'de> Deserialize<'de>>(source: &str) -> Result<T> {
    toml::from_str(source).map_err(|err| FeelError::Config(err.to_string()))
}

/// One route described as data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteSpec {
    /// Path the route answers to.
    pub pathname: String,
    /// Element trees rendered for the path.
    #[serde(default)]
    pub components: Vec<ElementSpec>,
}

impl RouteSpec {
    /// Build the element trees.
    pub fn build(&self) -> Result<Route> {
        let nodes = self
            .components
            .iter()
            .map(ElementSpec::build)
            .collect::<Result<Vec<_>>>()?;
        Ok(Route::new(self.pathname.clone(), nodes))
    }
}

/// Router setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// Path shown when history carries no marker.
    pub home_path: String,
    /// Initial route table.
    pub routes: Vec<RouteSpec>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            home_path: default_home_path(),
            routes: Vec::new(),
        }
    }
}

impl RouterConfig {
    /// Parse from JSON.
    pub fn from_json_str(source: &str) -> Result<Self> {
        parse_json(source)
    }

    /// Parse from TOML.
    #[cfg(feature = "config")]
    pub fn from_toml_str(source: &str) -> Result<Self> {
        parse_toml(source)
    }

    /// Build every route in order.
    pub fn build_routes(&self) -> Result<Vec<Route>> {
        self.routes.iter().map(RouteSpec::build).collect()
    }
}

/// Whole-application setup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeelConfig {
    /// Store settings.
    pub store: StoreConfig,
    /// Router settings.
    pub router: RouterConfig,
}

impl FeelConfig {
    /// Parse from JSON.
    pub fn from_json_str(source: &str) -> Result<Self> {
        parse_json(source)
    }

    /// Parse from TOML.
    #[cfg(feature = "config")]
    pub fn from_toml_str(source: &str) -> Result<Self> {
        parse_toml(source)
    }
}
