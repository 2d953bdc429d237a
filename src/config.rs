//! Configuración del compilador.

use crate::classes::ClassCache;

/// Opciones de compilación.
///
/// Los valores por defecto producen salida legible, con sangría de dos
/// espacios y fusión de reglas adyacentes equivalentes.
#[derive(Clone, Debug)]
pub struct Config {
    /// Omitir todo espacio opcional y el último `;` de cada bloque.
    pub compressed: bool,

    /// Unidad de sangría de la salida no comprimida.
    pub indentation: String,

    /// Segmento intermedio de los nombres de clase exportados.
    pub class_prefix: String,

    /// Largo del sufijo aleatorio de los nombres exportados.
    pub class_suffix_length: usize,

    /// Fusionar reglas adyacentes con el mismo selector y contexto.
    pub merge_rules: bool,

    /// Texto antepuesto tal cual a la hoja de estilos estática.
    pub license_notice: String,

    /// Caché de nombres exportados, compartida entre clones.
    pub class_cache: ClassCache,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            compressed: false,
            indentation: String::from("  "),
            class_prefix: String::from("vcss"),
            class_suffix_length: 5,
            merge_rules: true,
            license_notice: String::new(),
            class_cache: ClassCache::new(),
        }
    }
}

impl Config {
    /// Sangría efectiva: vacía si la salida es comprimida.
    pub fn indent(&self) -> &str {
        if self.compressed {
            ""
        } else {
            &self.indentation
        }
    }
}
