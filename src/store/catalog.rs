use chrono::{DateTime, Utc};

use crate::domain::content::{ContentItem, ContentProvider, ContentType};
use crate::domain::skill::{Skill, SkillEdge};
use crate::domain::DomainError;
use crate::services::dep_graph;

use super::{ensure_unmodified, MemoryStore, StoreInner};

/// Re-runs acyclicity over the whole catalog with `candidate` swapped in.
fn check_catalog_acyclic(inner: &StoreInner, candidate: &Skill) -> Result<(), DomainError> {
    let mut skills: Vec<Skill> = inner
        .skills
        .values()
        .filter(|s| s.id != candidate.id)
        .cloned()
        .collect();
    skills.push(candidate.clone());
    dep_graph::validate(&dep_graph::skill_nodes(&skills))
}

impl MemoryStore {
    pub fn create_skill(&self, skill: Skill) -> Result<Skill, DomainError> {
        skill.validate()?;

        let mut inner = self.write();
        if inner.skills.values().any(|s| s.slug == skill.slug) {
            return Err(DomainError::validation(format!(
                "skill slug {} is already taken",
                skill.slug
            )));
        }
        for prereq in &skill.prerequisites {
            inner.skill_exists(prereq)?;
        }
        check_catalog_acyclic(&inner, &skill)?;

        inner.skills.insert(skill.id.clone(), skill.clone());
        Ok(skill)
    }

    pub fn update_skill(
        &self,
        mut skill: Skill,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<Skill, DomainError> {
        skill.validate()?;

        let mut inner = self.write();
        let stored = inner
            .skills
            .get(&skill.id)
            .ok_or_else(|| DomainError::not_found("skill", &skill.id))?;
        ensure_unmodified("skill", &skill.id, stored.updated_at, expected_updated_at)?;
        let created_at = stored.created_at;

        if inner
            .skills
            .values()
            .any(|s| s.id != skill.id && s.slug == skill.slug)
        {
            return Err(DomainError::validation(format!(
                "skill slug {} is already taken",
                skill.slug
            )));
        }
        for prereq in &skill.prerequisites {
            inner.skill_exists(prereq)?;
        }
        check_catalog_acyclic(&inner, &skill)?;

        skill.created_at = created_at;
        skill.updated_at = Utc::now();
        inner.skills.insert(skill.id.clone(), skill.clone());
        Ok(skill)
    }

    pub fn skill(&self, id: &str) -> Result<Skill, DomainError> {
        self.read()
            .skills
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("skill", id))
    }

    pub fn skills(&self, domain: Option<&str>, tag: Option<&str>) -> Vec<Skill> {
        let inner = self.read();
        let mut skills: Vec<Skill> = inner
            .skills
            .values()
            .filter(|s| domain.map_or(true, |d| s.domain == d))
            .filter(|s| tag.map_or(true, |t| s.tags.iter().any(|have| have == t)))
            .cloned()
            .collect();
        skills.sort_by(|a, b| a.slug.cmp(&b.slug));
        skills
    }

    /// Skill ids in default execution order. The catalog is kept acyclic by
    /// every write, so the traversal always covers all skills.
    pub fn skill_order(&self) -> Vec<String> {
        let skills: Vec<Skill> = self.read().skills.values().cloned().collect();
        dep_graph::topological_order(&dep_graph::skill_nodes(&skills)).collect()
    }

    pub fn create_skill_edge(&self, edge: SkillEdge) -> Result<SkillEdge, DomainError> {
        edge.validate()?;

        let mut inner = self.write();
        inner.skill_exists(&edge.src_skill_id)?;
        inner.skill_exists(&edge.dst_skill_id)?;

        inner.skill_edges.insert(edge.id.clone(), edge.clone());
        Ok(edge)
    }

    pub fn skill_edges(&self, skill_id: Option<&str>) -> Vec<SkillEdge> {
        let inner = self.read();
        let mut edges: Vec<SkillEdge> = inner
            .skill_edges
            .values()
            .filter(|e| {
                skill_id.map_or(true, |id| e.src_skill_id == id || e.dst_skill_id == id)
            })
            .cloned()
            .collect();
        edges.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        edges
    }

    pub fn create_provider(&self, provider: ContentProvider) -> Result<ContentProvider, DomainError> {
        provider.validate()?;
        let mut inner = self.write();
        inner.providers.insert(provider.id.clone(), provider.clone());
        Ok(provider)
    }

    pub fn providers(&self) -> Vec<ContentProvider> {
        let mut providers: Vec<ContentProvider> =
            self.read().providers.values().cloned().collect();
        providers.sort_by(|a, b| a.name.cmp(&b.name));
        providers
    }

    pub fn create_content_item(&self, item: ContentItem) -> Result<ContentItem, DomainError> {
        item.validate()?;

        let mut inner = self.write();
        if !inner.providers.contains_key(&item.provider_id) {
            return Err(DomainError::not_found("content provider", &item.provider_id));
        }

        inner.content_items.insert(item.id.clone(), item.clone());
        Ok(item)
    }

    pub fn content_item(&self, id: &str) -> Result<ContentItem, DomainError> {
        self.read()
            .content_items
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("content item", id))
    }

    /// Case-insensitive title search over active items, optionally narrowed
    /// by type and tag.
    pub fn search_content(
        &self,
        query: Option<&str>,
        content_type: Option<ContentType>,
        tag: Option<&str>,
    ) -> Vec<ContentItem> {
        let needle = query.map(str::to_lowercase);
        let inner = self.read();
        let mut items: Vec<ContentItem> = inner
            .content_items
            .values()
            .filter(|item| item.is_active)
            .filter(|item| {
                needle
                    .as_deref()
                    .map_or(true, |n| item.title.to_lowercase().contains(n))
            })
            .filter(|item| content_type.map_or(true, |t| item.content_type == t))
            .filter(|item| tag.map_or(true, |t| item.tags.iter().any(|have| have == t)))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.title.cmp(&b.title));
        items
    }
}
