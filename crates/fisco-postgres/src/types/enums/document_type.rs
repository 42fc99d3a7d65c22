//! Document type enumeration for Brazilian MEI fiscal documents.

use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Classifies an uploaded document for extraction and downstream filing.
///
/// This enumeration corresponds to the `DOCUMENT_TYPE` PostgreSQL enum and
/// covers the document categories a MEI (microempreendedor individual)
/// submits over a fiscal year.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::DocumentType"]
pub enum DocumentType {
    /// Invoice issued by the MEI (nota fiscal emitida)
    #[db_rename = "nota_fiscal_emitida"]
    #[serde(rename = "nota_fiscal_emitida")]
    #[strum(serialize = "nota_fiscal_emitida")]
    NotaFiscalEmitida,

    /// Invoice received from a supplier (nota fiscal recebida)
    #[db_rename = "nota_fiscal_recebida"]
    #[serde(rename = "nota_fiscal_recebida")]
    #[strum(serialize = "nota_fiscal_recebida")]
    NotaFiscalRecebida,

    /// Bank statement (informe bancario)
    #[db_rename = "informe_bancario"]
    #[serde(rename = "informe_bancario")]
    #[strum(serialize = "informe_bancario")]
    InformeBancario,

    /// Deductible expense receipt (despesa dedutivel)
    #[db_rename = "despesa_dedutivel"]
    #[serde(rename = "despesa_dedutivel")]
    #[strum(serialize = "despesa_dedutivel")]
    DespesaDedutivel,

    /// Income report from payers (informe de rendimentos)
    #[db_rename = "informe_rendimentos"]
    #[serde(rename = "informe_rendimentos")]
    #[strum(serialize = "informe_rendimentos")]
    InformeRendimentos,

    /// Prior-year annual declaration (DASN-SIMEI)
    #[db_rename = "dasn_simei"]
    #[serde(rename = "dasn_simei")]
    #[strum(serialize = "dasn_simei")]
    DasnSimei,

    /// Prior-year income tax receipt (recibo IR anterior)
    #[db_rename = "recibo_ir_anterior"]
    #[serde(rename = "recibo_ir_anterior")]
    #[strum(serialize = "recibo_ir_anterior")]
    ReciboIrAnterior,

    /// Identity document (documento de identificacao)
    #[db_rename = "doc_identificacao"]
    #[serde(rename = "doc_identificacao")]
    #[strum(serialize = "doc_identificacao")]
    DocIdentificacao,

    /// Proof of address (comprovante de endereco)
    #[db_rename = "comprovante_endereco"]
    #[serde(rename = "comprovante_endereco")]
    #[strum(serialize = "comprovante_endereco")]
    ComprovanteEndereco,
}

impl DocumentType {
    /// Returns whether extraction for this type produces structured
    /// financial fields (amounts, dates, counterparties).
    #[inline]
    pub fn is_financial(self) -> bool {
        matches!(
            self,
            DocumentType::NotaFiscalEmitida
                | DocumentType::NotaFiscalRecebida
                | DocumentType::InformeBancario
                | DocumentType::DespesaDedutivel
                | DocumentType::InformeRendimentos
        )
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn parses_wire_names() {
        let parsed = DocumentType::from_str("nota_fiscal_emitida").unwrap();
        assert_eq!(parsed, DocumentType::NotaFiscalEmitida);
        assert!(DocumentType::from_str("nota_fiscal").is_err());
    }

    #[test]
    fn display_matches_serde() {
        let json = serde_json::to_string(&DocumentType::DasnSimei).unwrap();
        assert_eq!(json, format!("\"{}\"", DocumentType::DasnSimei));
    }
}
