//! Client for the Atlas Academy API (https://api.atlasacademy.io).
//!
//! Successful responses are cached in-process by URL for the life of the bot,
//! and the once-per-process exports (trait table, enum tables, CV list) sit
//! behind lazily initialized cells that are immutable after first fetch.

pub mod model;

use crate::text::{self, Lookups};
use anyhow::{anyhow, Context, Result};
use dashmap::DashMap;
use model::{BasicBuff, BasicFunction, BasicServant, BasicSkill, CvEntry, Servant, Skill};
use reqwest::Url;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::OnceCell;

const API_BASE: &str = "https://api.atlasacademy.io";
pub const DB_BASE: &str = "https://apps.atlasacademy.io/db";
pub const DEFAULT_REGION: &str = "JP";

/// Whether a search runs over skills or noble phantasms. The API spells the
/// two differently in nice paths and the web DB spells them differently again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFlag {
    Skill,
    NoblePhantasm,
}

impl SearchFlag {
    pub fn api_path(self) -> &'static str {
        match self {
            SearchFlag::Skill => "skill",
            SearchFlag::NoblePhantasm => "NP",
        }
    }

    pub fn db_path(self) -> &'static str {
        match self {
            SearchFlag::Skill => "skill",
            SearchFlag::NoblePhantasm => "noble-phantasm",
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            SearchFlag::Skill => "Skills",
            SearchFlag::NoblePhantasm => "Noble Phantasms",
        }
    }
}

struct CvData {
    /// "jp-name (en-name)" per CV, in export order, for autocomplete.
    combined: Vec<(i64, String)>,
    jp: HashMap<i64, String>,
    en: HashMap<i64, String>,
}

pub struct AtlasClient {
    http: reqwest::Client,
    cache: DashMap<String, Arc<Value>>,
    traits: OnceCell<Arc<HashMap<String, String>>>,
    enums: OnceCell<Arc<HashMap<String, BTreeMap<String, String>>>>,
    cv: OnceCell<Arc<CvData>>,
}

impl AtlasClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            cache: DashMap::new(),
            traits: OnceCell::new(),
            enums: OnceCell::new(),
            cv: OnceCell::new(),
        }
    }

    /// GET a JSON document, serving repeats from the in-process cache.
    /// Error documents (not-found sentinels included) are never cached.
    async fn fetch_json(&self, url: Url) -> Result<Arc<Value>> {
        let key = url.to_string();
        if let Some(hit) = self.cache.get(&key) {
            return Ok(Arc::clone(hit.value()));
        }
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("request to {key} failed"))?;
        let cacheable = response.status().is_success();
        let value: Value = response
            .json()
            .await
            .with_context(|| format!("invalid JSON from {key}"))?;
        let value = Arc::new(value);
        if cacheable {
            self.cache.insert(key, Arc::clone(&value));
        }
        Ok(value)
    }

    async fn fetch_list<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<Vec<T>> {
        let value = self.fetch_json(url).await?;
        if !value.is_array() {
            // Search endpoints answer invalid queries with a detail document.
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(value.as_ref().clone())?)
    }

    pub async fn servant_search(
        &self,
        name: &str,
        cv_id: &str,
        class_name: &str,
        region: &str,
    ) -> Result<Vec<BasicServant>> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if !name.is_empty() {
            params.push(("name", name.to_string()));
        }
        if !cv_id.is_empty() {
            params.push(("cv", self.cv_name(cv_id, region).await?));
        }
        if !class_name.is_empty() {
            params.push(("className", class_name.to_string()));
        }
        let url = Url::parse_with_params(&format!("{API_BASE}/basic/{region}/servant/search"), &params)?;
        self.fetch_list(url).await
    }

    pub async fn servant_by_id(&self, id: i64, region: &str) -> Result<Option<Servant>> {
        let url = Url::parse(&format!("{API_BASE}/nice/{region}/servant/{id}?lore=true"))?;
        let value = self.fetch_json(url).await?;
        if is_not_found(&value) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value.as_ref().clone())?))
    }

    pub async fn skill_by_id(&self, id: i64, region: &str) -> Result<Option<Skill>> {
        self.nice_skill(SearchFlag::Skill, id, region).await
    }

    pub async fn nice_skill(&self, flag: SearchFlag, id: i64, region: &str) -> Result<Option<Skill>> {
        let url = Url::parse(&format!("{API_BASE}/nice/{region}/{}/{id}", flag.api_path()))?;
        let value = self.fetch_json(url).await?;
        if is_not_found(&value) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value.as_ref().clone())?))
    }

    /// Functions with the given effect type, with their reverse skill/NP mapping.
    pub async fn functions_search(
        &self,
        func_type: &str,
        target: &str,
        region: &str,
    ) -> Result<Vec<BasicFunction>> {
        let mut params = vec![
            ("reverse", "true".to_string()),
            ("reverseDepth", "servant".to_string()),
            ("type", func_type.to_string()),
        ];
        if !target.is_empty() {
            params.push(("targetType", target.to_string()));
        }
        let url = Url::parse_with_params(&format!("{API_BASE}/basic/{region}/function/search"), &params)?;
        self.fetch_list(url).await
    }

    /// Functions whose target-trait filters include the given trait.
    pub async fn functions_by_trait(
        &self,
        trait_id: &str,
        target: &str,
        region: &str,
    ) -> Result<Vec<BasicFunction>> {
        let mut params = vec![
            ("reverse", "true".to_string()),
            ("reverseDepth", "servant".to_string()),
            ("tvals", trait_id.to_string()),
        ];
        if !target.is_empty() {
            params.push(("targetType", target.to_string()));
        }
        let url = Url::parse_with_params(&format!("{API_BASE}/basic/{region}/function/search"), &params)?;
        self.fetch_list(url).await
    }

    /// Noble phantasms whose sval tables reference the given trait.
    pub async fn nps_by_trait(&self, trait_id: &str, region: &str) -> Result<Vec<BasicSkill>> {
        let url = Url::parse_with_params(
            &format!("{API_BASE}/basic/{region}/NP/search"),
            &[("svalsContain", trait_id), ("reverse", "true")],
        )?;
        self.fetch_list(url).await
    }

    pub async fn buff_search(&self, buff_type: &str, region: &str) -> Result<Vec<BasicBuff>> {
        let url = Url::parse_with_params(
            &format!("{API_BASE}/basic/{region}/buff/search"),
            &[
                ("reverse", "true"),
                ("reverseDepth", "servant"),
                ("reverseData", "basic"),
                ("type", buff_type),
            ],
        )?;
        self.fetch_list(url).await
    }

    /// Trait ID -> display name. JP and NA share one table, fetched at most
    /// once per process.
    pub async fn traits(&self) -> Result<Arc<HashMap<String, String>>> {
        let table = self
            .traits
            .get_or_try_init(|| async {
                let url = Url::parse(&format!("{API_BASE}/export/JP/nice_trait.json"))?;
                let value = self.fetch_json(url).await?;
                let table: HashMap<String, String> = serde_json::from_value(value.as_ref().clone())?;
                Ok::<_, anyhow::Error>(Arc::new(table))
            })
            .await?;
        Ok(Arc::clone(table))
    }

    /// One enumeration table from the shared nice_enums export, e.g.
    /// "NiceFuncType" or "SvtClass". Unknown names yield an empty table.
    pub async fn enum_table(&self, enum_type: &str) -> Result<BTreeMap<String, String>> {
        let tables = self
            .enums
            .get_or_try_init(|| async {
                let url = Url::parse(&format!("{API_BASE}/export/JP/nice_enums.json"))?;
                let value = self.fetch_json(url).await?;
                let tables: HashMap<String, BTreeMap<String, String>> =
                    serde_json::from_value(value.as_ref().clone())?;
                Ok::<_, anyhow::Error>(Arc::new(tables))
            })
            .await?;
        Ok(tables.get(enum_type).cloned().unwrap_or_default())
    }

    async fn cv_data(&self) -> Result<Arc<CvData>> {
        let data = self
            .cv
            .get_or_try_init(|| async {
                let jp_url = Url::parse(&format!("{API_BASE}/export/JP/nice_cv.json"))?;
                let en_url = Url::parse(&format!("{API_BASE}/export/JP/nice_cv_lang_en.json"))?;
                let jp: Vec<CvEntry> = serde_json::from_value(self.fetch_json(jp_url).await?.as_ref().clone())?;
                let en: Vec<CvEntry> = serde_json::from_value(self.fetch_json(en_url).await?.as_ref().clone())?;
                let en_by_id: HashMap<i64, String> =
                    en.into_iter().map(|cv| (cv.id, cv.name)).collect();
                let mut combined = Vec::with_capacity(jp.len());
                let mut jp_by_id = HashMap::with_capacity(jp.len());
                for cv in jp {
                    let en_name = en_by_id.get(&cv.id).map(String::as_str).unwrap_or("?");
                    combined.push((cv.id, format!("{} ({})", cv.name, en_name)));
                    jp_by_id.insert(cv.id, cv.name);
                }
                Ok::<_, anyhow::Error>(Arc::new(CvData {
                    combined,
                    jp: jp_by_id,
                    en: en_by_id,
                }))
            })
            .await?;
        Ok(Arc::clone(data))
    }

    /// Autocomplete list of "jp-name (en-name)" labels keyed by CV ID.
    pub async fn cv_choices(&self) -> Result<Vec<(i64, String)>> {
        Ok(self.cv_data().await?.combined.clone())
    }

    /// Region-appropriate CV name for a CV ID chosen from autocomplete.
    pub async fn cv_name(&self, cv_id: &str, region: &str) -> Result<String> {
        let id: i64 = cv_id.parse().with_context(|| format!("bad cv id `{cv_id}`"))?;
        let data = self.cv_data().await?;
        let table = if region == "JP" { &data.jp } else { &data.en };
        table
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow!("unknown cv id {id}"))
    }

    /// Lookups for describing one standalone skill/NP: the trait table plus
    /// any sub-skills its Function-type buffs reference.
    pub async fn skill_lookups(&self, skill: &Skill, region: &str) -> Result<Lookups> {
        let traits = self.traits().await?;
        let mut sub_skills = HashMap::new();
        for id in text::sub_skill_refs(skill) {
            if sub_skills.contains_key(&id) {
                continue;
            }
            sub_skills.insert(id, self.skill_by_id(id, region).await?);
        }
        Ok(Lookups::new(traits, sub_skills))
    }

    /// Lookups covering every skill and noble phantasm of one servant.
    pub async fn servant_lookups(&self, servant: &Servant, region: &str) -> Result<Lookups> {
        let traits = self.traits().await?;
        let mut sub_skills = HashMap::new();
        for skill in servant.skills.iter().chain(servant.noble_phantasms.iter()) {
            for id in text::sub_skill_refs(skill) {
                if sub_skills.contains_key(&id) {
                    continue;
                }
                sub_skills.insert(id, self.skill_by_id(id, region).await?);
            }
        }
        Ok(Lookups::new(traits, sub_skills))
    }
}

/// The nice endpoints answer missing entities with `{"detail": "... not found"}`
/// rather than an empty body.
fn is_not_found(value: &Value) -> bool {
    value
        .get("detail")
        .and_then(Value::as_str)
        .map_or(false, |detail| detail.ends_with("not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_not_found_sentinels() {
        assert!(is_not_found(&json!({"detail": "Skill not found"})));
        assert!(is_not_found(&json!({"detail": "Svt not found"})));
        assert!(is_not_found(&json!({"detail": "NP not found"})));
        assert!(!is_not_found(&json!({"id": 1, "name": "Charisma"})));
        assert!(!is_not_found(&json!([1, 2, 3])));
    }

    #[test]
    fn search_flag_paths() {
        assert_eq!(SearchFlag::Skill.api_path(), "skill");
        assert_eq!(SearchFlag::NoblePhantasm.api_path(), "NP");
        assert_eq!(SearchFlag::NoblePhantasm.db_path(), "noble-phantasm");
        assert_eq!(SearchFlag::Skill.heading(), "Skills");
    }

    #[test]
    fn search_urls_encode_parameters() {
        let url = Url::parse_with_params(
            &format!("{API_BASE}/basic/JP/servant/search"),
            &[("name", "Jeanne d'Arc (Alter)")],
        )
        .unwrap();
        assert!(url.as_str().contains("name=Jeanne+d%27Arc+%28Alter%29"));
    }
}
