use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use super::client::BingError;

/// Voice gender as understood by the synthesis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(format!("unknown gender '{other}', expected 'male' or 'female'")),
        }
    }
}

/// One synthetic voice offered by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub locale: String,
    pub gender: Gender,
    /// Short name, e.g. `ZiraRUS` or `Stefan, Apollo`.
    pub name: String,
    /// Full service name, sent verbatim in the `<voice name='...'>` attribute.
    pub description: String,
}

/// Lookup of voices keyed by lowercase `"<locale> <gender>"`.
///
/// Several voices may share a key; they are kept in table order and the
/// first one is the default for that locale and gender.
pub struct VoiceCatalog {
    voices: HashMap<String, Vec<Voice>>,
}

impl VoiceCatalog {
    /// The catalog built from the service's published voice table.
    ///
    /// Parsed once on first use.
    pub fn builtin() -> &'static VoiceCatalog {
        static CATALOG: OnceLock<VoiceCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| {
            let catalog = VoiceCatalog::parse(VOICE_TABLE);
            log::debug!("Loaded {} voice keys", catalog.voices.len());
            catalog
        })
    }

    /// Parse a tab separated table of `locale<TAB>gender<TAB>"description"` rows.
    ///
    /// A trailing `*` on the locale is ignored. Rows that don't have three
    /// columns, an unknown gender or no voice name in the description are
    /// skipped with a warning.
    pub fn parse(table: &str) -> Self {
        let mut voices: HashMap<String, Vec<Voice>> = HashMap::new();

        for line in table.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let parts: Vec<&str> = line.split('\t').collect();
            if parts.len() < 3 {
                log::warn!("Skipping malformed voice row: {line:?}");
                continue;
            }

            let locale = parts[0].trim().replacen('*', "", 1);
            let gender = match parts[1].parse::<Gender>() {
                Ok(g) => g,
                Err(e) => {
                    log::warn!("Skipping voice row {line:?}: {e}");
                    continue;
                }
            };
            let description = parts[2].trim_matches(|c| c == '"' || c == ' ').to_string();
            let Some(name) = voice_name(&description) else {
                log::warn!("Skipping voice row without a voice name: {line:?}");
                continue;
            };

            voices
                .entry(voice_key(&locale, gender))
                .or_default()
                .push(Voice {
                    locale,
                    gender,
                    name,
                    description,
                });
        }

        Self { voices }
    }

    /// All voices for a locale and gender, in table order.
    pub fn candidates(&self, locale: &str, gender: Gender) -> &[Voice] {
        self.voices
            .get(&voice_key(locale, gender))
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }

    /// Pick a voice for a locale and gender.
    ///
    /// With an empty `name_hint` this is the first voice for the pair.
    /// Otherwise it is the first voice whose name contains the hint,
    /// ignoring case.
    pub fn resolve(
        &self,
        locale: &str,
        gender: Gender,
        name_hint: &str,
    ) -> Result<&Voice, BingError> {
        let key = voice_key(locale, gender);
        let candidates = self.candidates(locale, gender);
        if candidates.is_empty() {
            return Err(BingError::VoiceNotFound {
                key,
                available: Vec::new(),
            });
        }

        let hint = name_hint.trim().to_lowercase();
        candidates
            .iter()
            .find(|v| v.name.to_lowercase().contains(&hint))
            .ok_or_else(|| BingError::VoiceNotFound {
                key: format!("{key} ({})", name_hint.trim()),
                available: candidates.iter().map(|v| v.name.clone()).collect(),
            })
    }

    /// Number of distinct locale/gender keys.
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

fn voice_key(locale: &str, gender: Gender) -> String {
    format!("{} {}", locale.trim(), gender).to_lowercase()
}

/// Extract the voice name from a description like
/// `Microsoft Server Speech Text to Speech Voice (de-DE, Stefan, Apollo)`.
///
/// The name is whatever sits between the first comma after `(` and the next `)`.
fn voice_name(description: &str) -> Option<String> {
    let open = description.find('(')?;
    let rest = &description[open + 1..];
    let comma = rest.find(',')?;
    let rest = &rest[comma + 1..];
    let close = rest.find(')')?;
    let name = rest[..close].trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

const VOICE_TABLE: &str = "\
ar-EG*\tFemale\t\"Microsoft Server Speech Text to Speech Voice (ar-EG, Hoda)\"
ar-SA\tMale\t\"Microsoft Server Speech Text to Speech Voice (ar-SA, Naayf)\"
ca-ES\tFemale\t\"Microsoft Server Speech Text to Speech Voice (ca-ES, HerenaRUS)\"
cs-CZ\tMale\t\"Microsoft Server Speech Text to Speech Voice (cs-CZ, Vit)\"
da-DK\tFemale\t\"Microsoft Server Speech Text to Speech Voice (da-DK, HelleRUS)\"
de-AT\tMale\t\"Microsoft Server Speech Text to Speech Voice (de-AT, Michael)\"
de-CH\tMale\t\"Microsoft Server Speech Text to Speech Voice (de-CH, Karsten)\"
de-DE\tFemale\t\"Microsoft Server Speech Text to Speech Voice (de-DE, Hedda) \"
de-DE\tFemale\t\"Microsoft Server Speech Text to Speech Voice (de-DE, HeddaRUS)\"
de-DE\tMale\t\"Microsoft Server Speech Text to Speech Voice (de-DE, Stefan, Apollo) \"
el-GR\tMale\t\"Microsoft Server Speech Text to Speech Voice (el-GR, Stefanos)\"
en-AU\tFemale\t\"Microsoft Server Speech Text to Speech Voice (en-AU, Catherine) \"
en-AU\tFemale\t\"Microsoft Server Speech Text to Speech Voice (en-AU, HayleyRUS)\"
en-CA\tFemale\t\"Microsoft Server Speech Text to Speech Voice (en-CA, Linda)\"
en-CA\tFemale\t\"Microsoft Server Speech Text to Speech Voice (en-CA, HeatherRUS)\"
en-GB\tFemale\t\"Microsoft Server Speech Text to Speech Voice (en-GB, Susan, Apollo)\"
en-GB\tFemale\t\"Microsoft Server Speech Text to Speech Voice (en-GB, HazelRUS)\"
en-GB\tMale\t\"Microsoft Server Speech Text to Speech Voice (en-GB, George, Apollo)\"
en-IE\tMale\t\"Microsoft Server Speech Text to Speech Voice (en-IE, Shaun)\"
en-IN\tFemale\t\"Microsoft Server Speech Text to Speech Voice (en-IN, Heera, Apollo)\"
en-IN\tFemale\t\"Microsoft Server Speech Text to Speech Voice (en-IN, PriyaRUS)\"
en-IN\tMale\t\"Microsoft Server Speech Text to Speech Voice (en-IN, Ravi, Apollo) \"
en-US\tFemale\t\"Microsoft Server Speech Text to Speech Voice (en-US, ZiraRUS)\"
en-US\tFemale\t\"Microsoft Server Speech Text to Speech Voice (en-US, JessaRUS)\"
en-US\tMale\t\"Microsoft Server Speech Text to Speech Voice (en-US, BenjaminRUS)\"
es-ES\tFemale\t\"Microsoft Server Speech Text to Speech Voice (es-ES, Laura, Apollo)\"
es-ES\tFemale\t\"Microsoft Server Speech Text to Speech Voice (es-ES, HelenaRUS)\"
es-ES\tMale\t\"Microsoft Server Speech Text to Speech Voice (es-ES, Pablo, Apollo)\"
es-MX\tFemale\t\"Microsoft Server Speech Text to Speech Voice (es-MX, HildaRUS)\"
es-MX\tMale\t\"Microsoft Server Speech Text to Speech Voice (es-MX, Raul, Apollo)\"
fi-FI\tFemale\t\"Microsoft Server Speech Text to Speech Voice (fi-FI, HeidiRUS)\"
fr-CA\tFemale\t\"Microsoft Server Speech Text to Speech Voice (fr-CA, Caroline)\"
fr-CA\tFemale\t\"Microsoft Server Speech Text to Speech Voice (fr-CA, HarmonieRUS)\"
fr-CH\tMale\t\"Microsoft Server Speech Text to Speech Voice (fr-CH, Guillaume)\"
fr-FR\tFemale\t\"Microsoft Server Speech Text to Speech Voice (fr-FR, Julie, Apollo)\"
fr-FR\tFemale\t\"Microsoft Server Speech Text to Speech Voice (fr-FR, HortenseRUS)\"
fr-FR\tMale\t\"Microsoft Server Speech Text to Speech Voice (fr-FR, Paul, Apollo)\"
he-IL\tMale\t\"Microsoft Server Speech Text to Speech Voice (he-IL, Asaf)\"
hi-IN\tFemale\t\"Microsoft Server Speech Text to Speech Voice (hi-IN, Kalpana, Apollo)\"
hi-IN\tFemale\t\"Microsoft Server Speech Text to Speech Voice (hi-IN, Kalpana)\"
hi-IN\tMale\t\"Microsoft Server Speech Text to Speech Voice (hi-IN, Hemant)\"
hu-HU\tMale\t\"Microsoft Server Speech Text to Speech Voice (hu-HU, Szabolcs)\"
id-ID\tMale\t\"Microsoft Server Speech Text to Speech Voice (id-ID, Andika)\"
it-IT\tMale\t\"Microsoft Server Speech Text to Speech Voice (it-IT, Cosimo, Apollo)\"
ja-JP\tFemale\t\"Microsoft Server Speech Text to Speech Voice (ja-JP, Ayumi, Apollo)\"
ja-JP\tMale\t\"Microsoft Server Speech Text to Speech Voice (ja-JP, Ichiro, Apollo)\"
ja-JP\tFemale\t\"Microsoft Server Speech Text to Speech Voice (ja-JP, HarukaRUS)\"
ja-JP\tFemale\t\"Microsoft Server Speech Text to Speech Voice (ja-JP, LuciaRUS)\"
ja-JP\tMale\t\"Microsoft Server Speech Text to Speech Voice (ja-JP, EkaterinaRUS)\"
ko-KR\tFemale\t\"Microsoft Server Speech Text to Speech Voice (ko-KR, HeamiRUS)\"
nb-NO\tFemale\t\"Microsoft Server Speech Text to Speech Voice (nb-NO, HuldaRUS)\"
nl-NL\tFemale\t\"Microsoft Server Speech Text to Speech Voice (nl-NL, HannaRUS)\"
pl-PL\tFemale\t\"Microsoft Server Speech Text to Speech Voice (pl-PL, PaulinaRUS)\"
pt-BR\tFemale\t\"Microsoft Server Speech Text to Speech Voice (pt-BR, HeloisaRUS)\"
pt-BR\tMale\t\"Microsoft Server Speech Text to Speech Voice (pt-BR, Daniel, Apollo)\"
pt-PT\tFemale\t\"Microsoft Server Speech Text to Speech Voice (pt-PT, HeliaRUS)\"
ro-RO\tMale\t\"Microsoft Server Speech Text to Speech Voice (ro-RO, Andrei)\"
ru-RU\tFemale\t\"Microsoft Server Speech Text to Speech Voice (ru-RU, Irina, Apollo)\"
ru-RU\tMale\t\"Microsoft Server Speech Text to Speech Voice (ru-RU, Pavel, Apollo)\"
sk-SK\tMale\t\"Microsoft Server Speech Text to Speech Voice (sk-SK, Filip)\"
sv-SE\tFemale\t\"Microsoft Server Speech Text to Speech Voice (sv-SE, HedvigRUS)\"
th-TH\tMale\t\"Microsoft Server Speech Text to Speech Voice (th-TH, Pattara)\"
tr-TR\tFemale\t\"Microsoft Server Speech Text to Speech Voice (tr-TR, SedaRUS)\"
zh-CN\tFemale\t\"Microsoft Server Speech Text to Speech Voice (zh-CN, HuihuiRUS)\"
zh-CN\tFemale\t\"Microsoft Server Speech Text to Speech Voice (zh-CN, Yaoyao, Apollo)\"
zh-CN\tMale\t\"Microsoft Server Speech Text to Speech Voice (zh-CN, Kangkang, Apollo)\"
zh-HK\tFemale\t\"Microsoft Server Speech Text to Speech Voice (zh-HK, Tracy, Apollo)\"
zh-HK\tFemale\t\"Microsoft Server Speech Text to Speech Voice (zh-HK, TracyRUS)\"
zh-HK\tMale\t\"Microsoft Server Speech Text to Speech Voice (zh-HK, Danny, Apollo)\"
zh-TW\tFemale\t\"Microsoft Server Speech Text to Speech Voice (zh-TW, Yating, Apollo)\"
zh-TW\tFemale\t\"Microsoft Server Speech Text to Speech Voice (zh-TW, HanHanRUS)\"
zh-TW\tMale\t\"Microsoft Server Speech Text to Speech Voice (zh-TW, Zhiwei, Apollo)\"
";
