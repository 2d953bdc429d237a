//! Nombres de clase exportados.
//!
//! Una clase marcada con el operador de exportación (`..nombre`) se
//! renombra a `<nombre>-<prefijo>-<sufijo aleatorio>`. El mismo nombre
//! original obtiene siempre el mismo nombre generado mientras viva la
//! caché, y dos nombres originales nunca comparten nombre generado.
//! La caché puede compartirse entre compilaciones clonándola.

use std::{
    collections::{hash_map::RandomState, HashMap, HashSet},
    fmt::{self, Debug},
    hash::{BuildHasher, Hasher},
    sync::{Arc, Mutex, PoisonError},
    time::{SystemTime, UNIX_EPOCH},
};

use tracing::trace;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Caché compartida de nombres generados.
#[derive(Clone, Default)]
pub struct ClassCache(Arc<Mutex<Registry>>);

struct Registry {
    names: HashMap<String, String>,
    taken: HashSet<String>,
    state: u64,
}

impl ClassCache {
    /// Crea una caché vacía con semilla aleatoria.
    pub fn new() -> Self {
        ClassCache::default()
    }

    /// Crea una caché vacía con semilla fija, para salidas reproducibles.
    pub fn seeded(seed: u64) -> Self {
        ClassCache(Arc::new(Mutex::new(Registry::seeded(seed))))
    }

    /// Obtiene o genera el nombre para `seed`.
    ///
    /// La consulta y la inserción ocurren bajo un mismo candado.
    pub fn generate(&self, seed: &str, prefix: &str, length: usize) -> String {
        let mut registry = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(name) = registry.names.get(seed) {
            return name.clone();
        }

        let name = loop {
            let candidate = format!("{}-{}-{}", seed, prefix, registry.suffix(length.max(1)));
            if !registry.taken.contains(&candidate) {
                break candidate;
            }
        };

        trace!(seed, name = %name, "generated exported class name");
        registry.taken.insert(name.clone());
        registry.names.insert(seed.to_owned(), name.clone());
        name
    }

    /// Nombre previamente generado para `seed`, si existe.
    pub fn get(&self, seed: &str) -> Option<String> {
        let registry = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        registry.names.get(seed).cloned()
    }

    /// Cantidad de nombres generados.
    pub fn len(&self) -> usize {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .names
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Debug for ClassCache {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ClassCache")
            .field("names", &self.len())
            .finish()
    }
}

impl Registry {
    fn seeded(seed: u64) -> Self {
        Registry {
            names: HashMap::new(),
            taken: HashSet::new(),
            state: seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1,
        }
    }

    // xorshift64*
    fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    fn suffix(&mut self, length: usize) -> String {
        (0..length)
            .map(|_| ALPHABET[(self.next() % ALPHABET.len() as u64) as usize] as char)
            .collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        let mut hasher = RandomState::new().build_hasher();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or_default();

        hasher.write_u64(nanos);
        Registry::seeded(hasher.finish())
    }
}

/// Clave con la que un nombre original aparece en el mapa de clases.
///
/// Las secuencias de `-` y `_` se eliminan y el carácter siguiente pasa
/// a mayúscula: `test-class` resulta en `testClass`.
pub fn class_key(original: &str) -> String {
    let mut key = String::with_capacity(original.len());
    let mut upper = false;

    for c in original.chars() {
        match c {
            '-' | '_' => upper = true,
            c if upper => {
                key.extend(c.to_uppercase());
                upper = false;
            }

            c => key.push(c),
        }
    }

    key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_generated(name: &str, seed: &str, prefix: &str, length: usize) -> bool {
        let head = format!("{}-{}-", seed, prefix);
        name.strip_prefix(&head)
            .map(|suffix| suffix.len() == length && suffix.bytes().all(|b| b.is_ascii_alphanumeric()))
            .unwrap_or(false)
    }

    #[test]
    fn test_name_shape() {
        let cache = ClassCache::seeded(7);
        let name = cache.generate("test", "vcss", 5);
        assert!(is_generated(&name, "test", "vcss", 5), "{}", name);
    }

    #[test]
    fn test_same_seed_same_name() {
        let cache = ClassCache::seeded(1);
        let first = cache.generate("button", "vcss", 5);
        let second = cache.generate("button", "vcss", 5);
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("button"), Some(first));
    }

    #[test]
    fn test_distinct_seeds_distinct_names() {
        let cache = ClassCache::seeded(2);
        let names: HashSet<_> = (0..200)
            .map(|index| cache.generate(&format!("c{}", index % 50), "x", 1))
            .collect();

        assert_eq!(names.len(), 50);
    }

    #[test]
    fn test_clones_share_state() {
        let cache = ClassCache::seeded(3);
        let shared = cache.clone();
        let name = cache.generate("card", "vcss", 5);
        assert_eq!(shared.generate("card", "vcss", 5), name);
    }

    #[test]
    fn test_class_key() {
        assert_eq!(class_key("test-class"), "testClass");
        assert_eq!(class_key("a__b-c"), "aBC");
        assert_eq!(class_key("trailing-"), "trailing");
        assert_eq!(class_key("plain"), "plain");
    }
}
