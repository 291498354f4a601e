use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use schemafs_core::{CatalogRow, Error, Executor, Result};

struct Rule {
    marker: String,
    provides: String,
    needs: Vec<String>,
}

/// In-memory stand-in for a database: a statement containing a rule's
/// marker fails until every object it needs has been provided.
#[derive(Default)]
pub struct ScriptedExecutor {
    rules: Vec<Rule>,
    created: Mutex<HashSet<String>>,
    attempts: Mutex<Vec<String>>,
    applied: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, marker: &str, provides: &str, needs: &[&str]) -> Self {
        self.rules.push(Rule {
            marker: marker.to_string(),
            provides: provides.to_string(),
            needs: needs.iter().map(|need| need.to_string()).collect(),
        });
        self
    }

    /// Every statement passed to `execute`, including failed ones.
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    /// Statements that succeeded, in order.
    pub fn applied(&self) -> Vec<String> {
        self.applied.lock().unwrap().clone()
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn execute(&self, sql: &str) -> Result<()> {
        self.attempts.lock().unwrap().push(sql.to_string());

        if let Some(rule) = self.rules.iter().find(|rule| sql.contains(&rule.marker)) {
            let mut created = self.created.lock().unwrap();
            if let Some(missing) = rule.needs.iter().find(|need| !created.contains(*need)) {
                return Err(Error::Db(format!("relation \"{missing}\" does not exist")));
            }
            created.insert(rule.provides.clone());
        }

        self.applied.lock().unwrap().push(sql.to_string());
        Ok(())
    }

    async fn query_rows(&self, _sql: &str) -> Result<Vec<CatalogRow>> {
        Ok(Vec::new())
    }
}
