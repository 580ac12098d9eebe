/*
    registry.rs - Schema registries for the two traffic directions

    A registry owns the schema definition currently in effect and the tree
    built from it. Both are published together through one atomic pointer:
    readers either see the previous pair or the new one, never a tree that
    is still being built. A failed load leaves the previous pair in place.
*/

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::{debug, info};

use crate::error::{CodecError, CodecResult};
use crate::message::MessageDescriptor;
use crate::metrics;
use crate::schema::{SchemaDefinition, SchemaTree};

/// Traffic direction a registry serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Messages this process sends; used by encode
    Outbound,
    /// Messages this process receives; used by decode
    Inbound,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Outbound => "outbound",
            Side::Inbound => "inbound",
        }
    }
}

impl FromStr for Side {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "outbound" | "server" => Ok(Side::Outbound),
            "inbound" | "client" => Ok(Side::Inbound),
            _ => Err(CodecError::InvalidSide(s.to_string())),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct LoadedSchema {
    definition: Arc<SchemaDefinition>,
    tree: Arc<SchemaTree>,
}

/// Definition and tree for one side
#[derive(Debug)]
pub struct SchemaRegistry {
    side: Side,
    current: ArcSwapOption<LoadedSchema>,
    generation: AtomicU64,
}

impl SchemaRegistry {
    /// Create a registry with no schema loaded
    pub fn new(side: Side) -> Self {
        SchemaRegistry { side, current: ArcSwapOption::empty(), generation: AtomicU64::new(0) }
    }

    /// Create a registry and load `definition` into it
    pub fn with_definition(side: Side, definition: SchemaDefinition) -> CodecResult<Self> {
        let registry = Self::new(side);
        registry.load(definition)?;
        Ok(registry)
    }

    /// Build a tree from `definition` and publish both
    pub fn load(&self, definition: SchemaDefinition) -> CodecResult<()> {
        let tree = match SchemaTree::build(&definition) {
            Ok(tree) => tree,
            Err(err) => {
                debug!(side = %self.side, error = %err, "Schema load rejected");
                return Err(err);
            }
        };

        let messages = tree.message_count();
        self.current.store(Some(Arc::new(LoadedSchema {
            definition: Arc::new(definition),
            tree: Arc::new(tree),
        })));
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        metrics::record_reload(self.side);
        info!(side = %self.side, generation, messages, "Schema published");
        Ok(())
    }

    /// Read a JSON definition file and load it
    pub fn load_file(&self, path: impl AsRef<Path>) -> CodecResult<()> {
        self.load(SchemaDefinition::from_file(path)?)
    }

    /// Resolve `route`, or `None` if nothing is loaded or it names no message type
    pub fn lookup_raw(&self, route: &str) -> Option<MessageDescriptor> {
        let loaded = self.current.load_full()?;
        let index = loaded.tree.lookup(route)?;
        Some(MessageDescriptor::new(Arc::clone(&loaded.tree), index))
    }

    /// Resolve `route`, failing with `RouteNotFound`
    pub fn lookup_type(&self, route: &str) -> CodecResult<MessageDescriptor> {
        self.lookup_raw(route).ok_or_else(|| {
            debug!(side = %self.side, route, "Route not found");
            CodecError::RouteNotFound(route.to_string())
        })
    }

    /// Definition currently in effect
    pub fn definition(&self) -> Option<Arc<SchemaDefinition>> {
        self.current.load_full().map(|loaded| Arc::clone(&loaded.definition))
    }

    pub fn tree(&self) -> Option<Arc<SchemaTree>> {
        self.current.load_full().map(|loaded| Arc::clone(&loaded.tree))
    }

    pub fn is_loaded(&self) -> bool {
        self.current.load().is_some()
    }

    /// Number of successful loads so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn side(&self) -> Side {
        self.side
    }
}
