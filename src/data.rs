use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordEntry {
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    #[serde(default)]
    pub phonetics: Vec<Phonetic>,
    #[serde(default)]
    pub meanings: Vec<Meaning>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phonetic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meaning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,
    #[serde(default)]
    pub definitions: Vec<Definition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub antonyms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    #[serde(default)]
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub antonyms: Vec<String>,
}

impl WordEntry {
    pub fn placeholder(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            ..Self::default()
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.phonetics.is_empty() && self.meanings.is_empty()
    }

    pub fn normalize(mut self) -> Self {
        self.phonetic = non_blank(self.phonetic.take());
        for phonetic in &mut self.phonetics {
            phonetic.text = non_blank(phonetic.text.take());
            phonetic.audio = non_blank(phonetic.audio.take());
        }
        self.phonetics
            .retain(|p| p.text.is_some() || p.audio.is_some());
        for meaning in &mut self.meanings {
            meaning.part_of_speech = non_blank(meaning.part_of_speech.take());
            meaning
                .definitions
                .retain(|d| !d.definition.trim().is_empty());
            for definition in &mut meaning.definitions {
                definition.example = non_blank(definition.example.take());
            }
        }
        self.meanings.retain(|m| !m.definitions.is_empty());
        self
    }

    pub fn first_audio(&self) -> Option<&str> {
        self.phonetics.iter().find_map(|p| p.audio.as_deref())
    }

    pub fn phonetic_text(&self) -> Option<&str> {
        self.phonetic
            .as_deref()
            .or_else(|| self.phonetics.iter().find_map(|p| p.text.as_deref()))
    }

    pub fn definitions(&self) -> impl Iterator<Item = &str> + '_ {
        self.meanings
            .iter()
            .flat_map(|m| m.definitions.iter().map(|d| d.definition.as_str()))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
