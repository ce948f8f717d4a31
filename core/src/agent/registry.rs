use crate::traits::Tool;
use anyhow::{Result, bail};
use std::sync::Arc;

#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        if self.get(tool.name()).is_some() {
            bail!("Tool '{}' is already registered", tool.name());
        }
        self.tools.push(tool);
        Ok(())
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Result<Self> {
        self.register(tool)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn descriptions(&self) -> String {
        self.tools
            .iter()
            .map(|t| t.render())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ToolError;
    use async_trait::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl Tool for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "does things"
        }

        async fn invoke(&self, input: &str) -> Result<String, ToolError> {
            Ok(input.to_string())
        }
    }

    #[test]
    fn lookup_is_exact() {
        let registry = ToolRegistry::new()
            .with_tool(Arc::new(Named("search")))
            .unwrap()
            .with_tool(Arc::new(Named("clock")))
            .unwrap();

        assert!(registry.get("search").is_some());
        assert!(registry.get("Search").is_none());
        assert!(registry.get("search ").is_none());
        assert!(registry.get("lookup").is_none());
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Named("clock"))).unwrap();
        assert!(registry.register(Arc::new(Named("clock"))).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn renders_in_registration_order() {
        let registry = ToolRegistry::new()
            .with_tool(Arc::new(Named("search")))
            .unwrap()
            .with_tool(Arc::new(Named("clock")))
            .unwrap();

        assert_eq!(registry.names(), vec!["search", "clock"]);
        assert_eq!(
            registry.descriptions(),
            "search: does things\nclock: does things"
        );
    }
}
