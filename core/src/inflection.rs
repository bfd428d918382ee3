//! English inflection for root keys and serializer lookup keys.

use heck::ToSnakeCase;

const UNCOUNTABLE: &[&str] = &[
  "equipment",
  "information",
  "metadata",
  "news",
  "series",
  "sheep",
  "species",
];

const IRREGULAR: &[(&str, &str)] = &[
  ("child", "children"),
  ("man", "men"),
  ("mouse", "mice"),
  ("person", "people"),
  ("woman", "women"),
];

/// Pluralizes the last `_`-separated segment of a snake_case word.
pub fn pluralize(word: &str) -> String {
  inflect_last_segment(word, pluralize_segment)
}

/// Singularizes the last `_`-separated segment of a snake_case word.
pub fn singularize(word: &str) -> String {
  inflect_last_segment(word, singularize_segment)
}

/// Normalized lookup key of a type tag: snake_case and singular, `BlogPosts` -> `blog_post`.
pub fn type_key(type_tag: &str) -> String {
  singularize(&type_tag.to_snake_case())
}

/// Root key of a collection of `type_tag`, `BlogPost` -> `blog_posts`.
pub fn collection_key(type_tag: &str) -> String {
  pluralize(&type_key(type_tag))
}

fn inflect_last_segment(word: &str, inflect: fn(&str) -> String) -> String {
  match word.rsplit_once('_') {
    Some((head, last)) => format!("{}_{}", head, inflect(last)),
    None => inflect(word),
  }
}

fn pluralize_segment(word: &str) -> String {
  if word.is_empty() || UNCOUNTABLE.contains(&word) {
    return word.to_string();
  }
  if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, plural)| *singular == word || *plural == word) {
    return plural.to_string();
  }
  if ["s", "x", "z", "ch", "sh"].iter().any(|suffix| word.ends_with(suffix)) {
    return format!("{}es", word);
  }
  if let Some(stem) = word.strip_suffix('y') {
    if !stem.is_empty() && !stem.ends_with(is_vowel) {
      return format!("{}ies", stem);
    }
  }
  format!("{}s", word)
}

fn singularize_segment(word: &str) -> String {
  if word.is_empty() || UNCOUNTABLE.contains(&word) {
    return word.to_string();
  }
  if let Some((singular, _)) = IRREGULAR.iter().find(|(singular, plural)| *singular == word || *plural == word) {
    return singular.to_string();
  }
  if let Some(stem) = word.strip_suffix("ies") {
    if !stem.is_empty() {
      return format!("{}y", stem);
    }
  }
  for suffix in ["sses", "xes", "zes", "ches", "shes", "uses"] {
    if word.ends_with(suffix) {
      return word[..word.len() - 2].to_string();
    }
  }
  if ["ss", "us", "is"].iter().any(|suffix| word.ends_with(suffix)) {
    return word.to_string();
  }
  match word.strip_suffix('s') {
    Some(stem) if !stem.is_empty() => stem.to_string(),
    _ => word.to_string(),
  }
}

fn is_vowel(c: char) -> bool {
  matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}
