//! English dictionary lookup against the free dictionaryapi.dev service.

use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_DICTIONARY_URL: &str = "https://api.dictionaryapi.dev/api/v2";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_SYNONYMS: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Phonetic {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub audio: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Definition {
    pub definition: String,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

impl Definition {
    /// At most five synonyms, as shown to the learner.
    pub fn top_synonyms(&self) -> &[String] {
        &self.synonyms[..self.synonyms.len().min(MAX_SYNONYMS)]
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meaning {
    #[serde(default)]
    pub part_of_speech: Option<String>,
    #[serde(default)]
    pub definitions: Vec<Definition>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct WordDetails {
    pub word: String,
    #[serde(default)]
    pub phonetics: Vec<Phonetic>,
    #[serde(default)]
    pub meanings: Vec<Meaning>,
    #[serde(default, alias = "etymology")]
    pub origin: Option<String>,
}

impl WordDetails {
    /// First phonetic carrying IPA text, else the first phonetic at all.
    pub fn pronunciation(&self) -> Option<&Phonetic> {
        self.phonetics
            .iter()
            .find(|p| p.text.as_deref().is_some_and(|t| !t.is_empty()))
            .or_else(|| self.phonetics.first())
    }

    /// Distinct parts of speech in first-seen order.
    pub fn parts_of_speech(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for pos in self
            .meanings
            .iter()
            .filter_map(|m| m.part_of_speech.as_deref())
        {
            if !out.contains(&pos) {
                out.push(pos);
            }
        }
        out
    }
}

/// Parse a dictionary response body. The service answers with an array of
/// entries; only the first is used.
pub fn parse_entries(body: &str) -> Result<Option<WordDetails>> {
    let entries: Vec<WordDetails> =
        serde_json::from_str(body).map_err(|e| anyhow!("invalid dictionary response: {}", e))?;
    Ok(entries.into_iter().next())
}

pub struct DictionaryClient {
    agent: ureq::Agent,
    base: Url,
}

impl DictionaryClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| anyhow!("invalid dictionary url {}: {}", base_url, e))?;
        if base.cannot_be_a_base() {
            return Err(anyhow!("dictionary url cannot be a base: {}", base_url));
        }
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Ok(Self { agent, base })
    }

    pub fn entry_url(&self, word: &str) -> Result<Url> {
        let word = word.trim();
        if word.is_empty() {
            return Err(anyhow!("cannot look up an empty word"));
        }
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("dictionary url cannot be a base"))?
            .pop_if_empty()
            .extend(["entries", "en", word]);
        Ok(url)
    }

    /// Look up a word. `Ok(None)` means the service does not know it.
    pub fn lookup(&self, word: &str) -> Result<Option<WordDetails>> {
        let url = self.entry_url(word)?;
        log::debug!("dictionary lookup: {}", url);
        let response = match self.agent.get(url.as_str()).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(404, _)) => return Ok(None),
            Err(ureq::Error::Status(code, _)) => {
                return Err(anyhow!("dictionary lookup for '{}' failed: HTTP {}", word, code))
            }
            Err(e) => return Err(anyhow!("dictionary lookup for '{}' failed: {}", word, e)),
        };
        let body = response.into_string()?;
        parse_entries(&body)
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUP: &str = r#"[
      {
        "word": "cup",
        "phonetics": [
          {"audio": ""},
          {"text": "/kʌp/", "audio": "https://example.test/cup.mp3"}
        ],
        "origin": "Old English cuppe",
        "meanings": [
          {
            "partOfSpeech": "noun",
            "definitions": [
              {
                "definition": "A small container used for drinking.",
                "example": "a cup of tea",
                "synonyms": ["mug", "beaker", "chalice", "goblet", "tumbler", "tankard"]
              }
            ]
          },
          {"partOfSpeech": "verb", "definitions": [{"definition": "To form into a cup shape."}]},
          {"partOfSpeech": "noun", "definitions": []}
        ]
      },
      {"word": "cup", "meanings": []}
    ]"#;

    #[test]
    fn parses_first_entry() {
        let details = parse_entries(CUP).unwrap().unwrap();
        assert_eq!(details.word, "cup");
        assert_eq!(details.origin.as_deref(), Some("Old English cuppe"));
        assert_eq!(details.parts_of_speech(), vec!["noun", "verb"]);

        let phonetic = details.pronunciation().unwrap();
        assert_eq!(phonetic.text.as_deref(), Some("/kʌp/"));
        assert_eq!(details.phonetics[0].audio, None);

        let def = &details.meanings[0].definitions[0];
        assert_eq!(def.top_synonyms().len(), 5);
        assert_eq!(def.example.as_deref(), Some("a cup of tea"));
        assert!(details.meanings[1].definitions[0].synonyms.is_empty());
    }

    #[test]
    fn etymology_is_accepted_as_origin() {
        let details = parse_entries(r#"[{"word": "dog", "etymology": "from docga"}]"#)
            .unwrap()
            .unwrap();
        assert_eq!(details.origin.as_deref(), Some("from docga"));
        assert!(details.pronunciation().is_none());
    }

    #[test]
    fn empty_array_and_garbage() {
        assert_eq!(parse_entries("[]").unwrap(), None);
        assert!(parse_entries(r#"{"title": "No Definitions Found"}"#).is_err());
    }

    #[test]
    fn entry_url_escapes_word() {
        let client = DictionaryClient::new("https://dict.example/api/v2/").unwrap();
        assert_eq!(
            client.entry_url(" cell phone ").unwrap().as_str(),
            "https://dict.example/api/v2/entries/en/cell%20phone"
        );
        assert!(client.entry_url("  ").is_err());
        assert!(DictionaryClient::new("not a url").is_err());
    }
}
