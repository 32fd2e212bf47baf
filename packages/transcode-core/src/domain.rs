use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::errors::DomainError;

/// 保守的な FQDN 文法
///
/// 英数字とアンダースコアを `.` `-` `+` の単一区切りで連結し、
/// 最後のドット以前に2文字以上、最終ラベルは英字2〜6文字。
static DOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_](?:[.+\-]?[A-Za-z0-9_])+\.[A-Za-z]{2,6}$")
        .expect("domain pattern is valid")
});

/// ドメイン名が FQDN 文法に一致するか
pub fn is_valid_domain(name: &str) -> bool {
    DOMAIN_RE.is_match(name)
}

/// ラベルが3つ以上あればサブドメイン
pub fn is_subdomain(name: &str) -> bool {
    name.split('.').count() > 2
}

/// 末尾2ラベルを apex ドメインとして返す
pub fn apex_of(name: &str) -> String {
    let labels: Vec<&str> = name.split('.').collect();
    let start = labels.len().saturating_sub(2);
    labels[start..].join(".")
}

/// apex より前のラベルを返す（なければ空文字）
pub fn subdomain_label_of(name: &str) -> String {
    let labels: Vec<&str> = name.split('.').collect();
    let end = labels.len().saturating_sub(2);
    labels[..end].join(".")
}

/// キャッシュ層・証明書に登録する名前の一覧
///
/// apex ドメインの場合のみ `www.` エイリアスを自動追加する。
pub fn names_to_register(fqdn: &str) -> Result<Vec<String>, DomainError> {
    if !is_valid_domain(fqdn) {
        return Err(DomainError::Invalid(fqdn.to_string()));
    }

    if is_subdomain(fqdn) {
        Ok(vec![fqdn.to_string()])
    } else {
        Ok(vec![fqdn.to_string(), format!("www.{fqdn}")])
    }
}

/// デプロイ時に一度だけ計算されるドメイン集合
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainSet {
    apex: String,
    subdomain: Option<String>,
    names: Vec<String>,
}

impl DomainSet {
    /// FQDN から DomainSet を作成する
    pub fn from_fqdn(fqdn: &str) -> Result<Self, DomainError> {
        let names = names_to_register(fqdn)?;
        let subdomain = Some(subdomain_label_of(fqdn)).filter(|label| !label.is_empty());

        Ok(Self {
            apex: apex_of(fqdn),
            subdomain,
            names,
        })
    }

    pub fn apex(&self) -> &str {
        &self.apex
    }

    pub fn subdomain(&self) -> Option<&str> {
        self.subdomain.as_deref()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// エッジのホスト名に向ける DNS レコードを作成する
    ///
    /// apex の場合は apex への alias A レコードと `www` の CNAME、
    /// サブドメインの場合は FQDN の CNAME のみ。
    pub fn dns_records(&self, target: &str) -> Vec<DnsRecord> {
        match &self.subdomain {
            None => vec![
                DnsRecord {
                    kind: DnsRecordKind::AliasA,
                    name: self.apex.clone(),
                    target: target.to_string(),
                },
                DnsRecord {
                    kind: DnsRecordKind::Cname,
                    name: format!("www.{}", self.apex),
                    target: target.to_string(),
                },
            ],
            Some(_) => vec![DnsRecord {
                kind: DnsRecordKind::Cname,
                name: self.names[0].clone(),
                target: target.to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DnsRecordKind {
    #[serde(rename = "A")]
    AliasA,
    Cname,
}

/// ゾーンに作成するレコード
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsRecord {
    pub kind: DnsRecordKind,
    pub name: String,
    pub target: String,
}
