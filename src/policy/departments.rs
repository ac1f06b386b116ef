//! Project to department resolution.

use crate::config::{InstallerConfig, split_list};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Projects whose departments differ from the configured list.
pub const DEPARTMENT_OVERRIDES: &[(&str, &[&str])] = &[
    ("总经办", &["总经办"]),
    ("职能部门", &["人力行政部", "财务管理部", "运营管理部"]),
    ("卖场", &["卖场服务部"]),
    ("万晟汇", &["万晟汇"]),
];

/// Maps a selected project to the departments offered for it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentResolver {
    fallback: Vec<String>,
}

impl DepartmentResolver {
    /// Resolver whose fallback is the comma separated `department_list`.
    pub fn new(department_list: &str) -> Self {
        Self {
            fallback: split_list(department_list),
        }
    }

    pub fn from_config(config: &InstallerConfig) -> Self {
        Self::new(&config.department_list)
    }

    /// Departments offered for `project`.
    ///
    /// An empty project yields no departments; projects in
    /// [`DEPARTMENT_OVERRIDES`] get their fixed list; everything else gets
    /// the configured fallback list.
    pub fn resolve(&self, project: &str) -> Vec<String> {
        if project.is_empty() {
            return Vec::new();
        }
        match Self::override_for(project) {
            Some(departments) => departments.iter().map(|d| d.to_string()).collect(),
            None => self.fallback.clone(),
        }
    }

    /// Fixed department list for `project`, if it has one.
    pub fn override_for(project: &str) -> Option<&'static [&'static str]> {
        DEPARTMENT_OVERRIDES
            .iter()
            .find(|(name, _)| *name == project)
            .map(|(_, departments)| *departments)
    }

    /// The configured fallback list.
    pub fn fallback(&self) -> &[String] {
        &self.fallback
    }

    /// Resolved departments for each project, in project order.
    pub fn table(&self, projects: &[String]) -> Vec<(String, Vec<String>)> {
        projects
            .iter()
            .map(|p| (p.clone(), self.resolve(p)))
            .collect()
    }

    /// The override table as owned data, for embedding into artifacts.
    pub fn overrides() -> BTreeMap<String, Vec<String>> {
        DEPARTMENT_OVERRIDES
            .iter()
            .map(|(p, ds)| (p.to_string(), ds.iter().map(|d| d.to_string()).collect()))
            .collect()
    }
}
