//! luna-core — structures de données du cœur de la VM Luna
//!
//! Fournit :
//! - `Value` + `ValuePool` (pool de constantes, indices stables)
//! - `Chunk` : flux d'octets + table des lignes (parallèle) + constantes
//! - `OpCode` / `Instruction` + décodage borné (`decode`, `Chunk::instructions`)
//! - Désassembleur structuré (`disassemble_chunk`, `disassemble_instruction`)
//! - Validation (`validate_chunk`)
//! - Erreurs `CoreError` + alias `CoreResult<T>`
//!
//! Features :
//! - `serde` (par défaut) : derive (dé)sérialisation des valeurs et traces

#![deny(missing_docs)]

/* ─────────────────────────── Modules publics ─────────────────────────── */

/// Primitives de bytecode (chunk, opcodes, décodage, désassembleur, helpers).
pub mod bytecode;
/// Valeurs runtime et pool de constantes.
pub mod value;

mod memory;

/// Compatibilité : ré-exporte le désassembleur textuel.
pub use bytecode::disasm;
pub use bytecode::{Chunk, Instruction, OpCode};
pub use value::{Value, ValuePool};

/* ─────────────────────────── Résultat commun ─────────────────────────── */

/// Alias résultat commun au core.
pub type CoreResult<T> = core::result::Result<T, CoreError>;

/* ─────────────────────────── Erreurs ─────────────────────────── */

/// Erreurs récupérables du cœur (flux corrompu ou tronqué, pool saturé).
///
/// L'épuisement mémoire n'en fait pas partie : un échec d'allocation
/// interrompt le processus.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Lecture d'opérande au-delà de la fin de `code`.
    #[error("out-of-bounds decode: need {needed} byte(s) at offset {offset}, code length is {len}")]
    OutOfBounds {
        /// Offset de la lecture fautive.
        offset: usize,
        /// Nombre d'octets demandés.
        needed: usize,
        /// Longueur du flux.
        len: usize,
    },
    /// Octet inconnu en début d'instruction.
    #[error("unknown opcode {byte} at offset {offset}")]
    UnknownOpcode {
        /// Offset de l'instruction.
        offset: usize,
        /// Valeur brute de l'octet.
        byte: u8,
    },
    /// Opérande de constante sans entrée dans le pool.
    #[error("instruction at offset {offset} references constant {index} but pool size is {pool_len}")]
    DanglingConstant {
        /// Offset de l'instruction.
        offset: usize,
        /// Index lu dans l'opérande.
        index: usize,
        /// Taille du pool au moment de la lecture.
        pool_len: usize,
    },
    /// Le pool dépasse l'index le plus large encodable.
    #[error("constant pool overflow: index {index} does not fit in a 24-bit operand")]
    ConstantPoolOverflow {
        /// Index qui aurait été attribué.
        index: usize,
    },
    /// `code` et `lines` ne sont plus synchronisés.
    #[error("line table out of sync: {code} code byte(s) but {lines} line entries")]
    LineMismatch {
        /// Longueur de `code`.
        code: usize,
        /// Longueur de `lines`.
        lines: usize,
    },
    /// Un octet d'opérande porte une autre ligne que son opcode.
    #[error("operand byte at offset {offset} is on line {found}, its opcode is on line {expected}")]
    SplitLine {
        /// Offset de l'octet d'opérande.
        offset: usize,
        /// Ligne de l'opcode.
        expected: u32,
        /// Ligne trouvée sur l'opérande.
        found: u32,
    },
}

/* ─────────────────────────── Prélude (reexports utiles) ─────────────────────────── */

/// Prélude pratique pour importer les types/funcs clés du crate.
pub mod prelude {
    /// Réexports utiles pour une importation rapide.
    pub use super::{
        bytecode::{
            decode, disassemble_chunk, disassemble_instruction, validate_chunk, LineMark, Trace,
            TraceLine, TraceOp,
        },
        Chunk, CoreError, CoreResult, Instruction, OpCode, Value, ValuePool,
    };
}

/* ─────────────────────────── Tests ─────────────────────────── */
