use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FaceError {
    #[error("morph target '{0}' is missing from the model")]
    UnknownTarget(String),
}

/// Morph-target influences of the actor's face, each in 0..=1.
#[derive(Debug, Clone, PartialEq)]
pub struct Expressions {
    targets: Vec<(String, f32)>,
}

impl Expressions {
    pub fn new(names: &[String]) -> Self {
        Self {
            targets: names.iter().map(|n| (n.clone(), 0.0)).collect(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(|(n, _)| n.as_str())
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Result<f32, FaceError> {
        self.targets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
            .ok_or_else(|| FaceError::UnknownTarget(name.to_string()))
    }

    pub fn set(&mut self, name: &str, value: f32) -> Result<(), FaceError> {
        let slot = self
            .targets
            .iter_mut()
            .find(|(n, _)| n == name)
            .ok_or_else(|| FaceError::UnknownTarget(name.to_string()))?;
        slot.1 = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        Ok(())
    }
}
