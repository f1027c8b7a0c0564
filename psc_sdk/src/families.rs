//! Built-in template family profiles for Microsoft Intune payloads
//!
//! Catalogs only need to declare families whose shape these profiles get
//! wrong; anything a catalog defines under the same name takes precedence.

use psc_catalog::{PathExpr, TemplateFamilyProfile};

pub const WINDOWS_ENDPOINT_PROTECTION: &str = "windows10EndpointProtection";
pub const WINDOWS_GENERAL: &str = "windows10General";
pub const IOS_GENERAL: &str = "iosGeneral";
pub const ANDROID_GENERAL: &str = "androidGeneral";
pub const MACOS_GENERAL: &str = "macOSGeneral";
pub const COMPLIANCE: &str = "compliance";
pub const SETTINGS_CATALOG: &str = "settingsCatalog";
pub const DISK_ENCRYPTION_INTENT: &str = "endpointSecurityDiskEncryption";
pub const APP_PROTECTION: &str = "appProtection";

const GRAPH: &str = "#microsoft.graph.";

fn graph_type(name: &str) -> String {
    format!("{}{}", GRAPH, name)
}

/// Every built-in profile, in lookup order
pub fn builtin_families() -> Vec<TemplateFamilyProfile> {
    vec![
        windows_endpoint_protection(),
        windows_general(),
        ios_general(),
        android_general(),
        macos_general(),
        compliance(),
        settings_catalog(),
        disk_encryption_intent(),
        app_protection(),
    ]
}

/// BitLocker, Defender firewall and Smart Screen settings
///
/// Drive encryption settings live in one nested object per drive type.
pub fn windows_endpoint_protection() -> TemplateFamilyProfile {
    TemplateFamilyProfile::new(WINDOWS_ENDPOINT_PROTECTION)
        .with_odata_type(graph_type("windows10EndpointProtectionConfiguration"))
        .with_prefix(PathExpr::key("bitLockerSystemDrivePolicy"))
        .with_prefix(PathExpr::key("bitLockerFixedDrivePolicy"))
        .with_prefix(PathExpr::key("bitLockerRemovableDrivePolicy"))
        .with_alias(
            &PathExpr::key("bitLockerEnabled"),
            PathExpr::key("bitLockerEncryptDevice"),
        )
        .with_alias(
            &PathExpr::key("encryptionMethod"),
            PathExpr::keys(&["bitLockerSystemDrivePolicy", "encryptionMethod"]),
        )
        .with_alias(
            &PathExpr::key("fixedDriveEncryptionMethod"),
            PathExpr::keys(&["bitLockerFixedDrivePolicy", "encryptionMethod"]),
        )
        .with_alias(
            &PathExpr::key("removableDriveEncryptionMethod"),
            PathExpr::keys(&["bitLockerRemovableDrivePolicy", "encryptionMethod"]),
        )
        .with_alias(
            &PathExpr::key("startupAuthenticationRequired"),
            PathExpr::keys(&["bitLockerSystemDrivePolicy", "startupAuthenticationRequired"]),
        )
        .with_prefix(PathExpr::key("firewallProfileDomain"))
        .with_prefix(PathExpr::key("firewallProfilePrivate"))
        .with_prefix(PathExpr::key("firewallProfilePublic"))
}

pub fn windows_general() -> TemplateFamilyProfile {
    TemplateFamilyProfile::new(WINDOWS_GENERAL)
        .with_odata_type(graph_type("windows10GeneralConfiguration"))
        .with_odata_type(graph_type("windows81GeneralConfiguration"))
        .with_alias(
            &PathExpr::key("screenLockTimeout"),
            PathExpr::key("passwordMinutesOfInactivityBeforeScreenTimeout"),
        )
        .with_prefix(PathExpr::key("defenderDetectedMalwareActions"))
}

pub fn ios_general() -> TemplateFamilyProfile {
    TemplateFamilyProfile::new(IOS_GENERAL)
        .with_odata_type(graph_type("iosGeneralDeviceConfiguration"))
        .with_odata_type(graph_type("iosDeviceFeaturesConfiguration"))
        .with_alias(
            &PathExpr::key("passwordRequired"),
            PathExpr::key("passcodeRequired"),
        )
        .with_alias(
            &PathExpr::key("passwordMinimumLength"),
            PathExpr::key("passcodeMinimumLength"),
        )
        .with_alias(
            &PathExpr::key("screenLockTimeout"),
            PathExpr::key("passcodeMinutesOfInactivityBeforeScreenTimeout"),
        )
}

pub fn android_general() -> TemplateFamilyProfile {
    TemplateFamilyProfile::new(ANDROID_GENERAL)
        .with_odata_type(graph_type("androidGeneralDeviceConfiguration"))
        .with_odata_type(graph_type("androidWorkProfileGeneralDeviceConfiguration"))
        .with_odata_type(graph_type("androidDeviceOwnerGeneralDeviceConfiguration"))
        .with_alias(
            &PathExpr::key("passwordRequired"),
            PathExpr::key("workProfilePasswordRequired"),
        )
        .with_alias(
            &PathExpr::key("passwordMinimumLength"),
            PathExpr::key("workProfilePasswordMinimumLength"),
        )
        .with_alias(
            &PathExpr::key("storageRequireEncryption"),
            PathExpr::key("storageRequireDeviceEncryption"),
        )
}

pub fn macos_general() -> TemplateFamilyProfile {
    TemplateFamilyProfile::new(MACOS_GENERAL)
        .with_odata_type(graph_type("macOSGeneralDeviceConfiguration"))
        .with_odata_type(graph_type("macOSEndpointProtectionConfiguration"))
        .with_alias(
            &PathExpr::key("fileVaultEnabled"),
            PathExpr::keys(&["fileVault", "enabled"]),
        )
}

/// Compliance policies share flat device-health and password fields
pub fn compliance() -> TemplateFamilyProfile {
    TemplateFamilyProfile::new(COMPLIANCE)
        .with_odata_type(graph_type("windows10CompliancePolicy"))
        .with_odata_type(graph_type("iosCompliancePolicy"))
        .with_odata_type(graph_type("androidCompliancePolicy"))
        .with_odata_type(graph_type("androidWorkProfileCompliancePolicy"))
        .with_odata_type(graph_type("androidDeviceOwnerCompliancePolicy"))
        .with_odata_type(graph_type("macOSCompliancePolicy"))
        .with_alias(
            &PathExpr::key("bitLockerEncryptDevice"),
            PathExpr::key("bitLockerEnabled"),
        )
        .with_alias(
            &PathExpr::key("passcodeRequired"),
            PathExpr::key("passwordRequired"),
        )
        .with_prefix(PathExpr::key("deviceThreatProtection"))
}

/// Settings catalog values are found by the array scan; the prefix covers
/// exports that wrap settings in a `settingsDelta` or `template` object
pub fn settings_catalog() -> TemplateFamilyProfile {
    TemplateFamilyProfile::new(SETTINGS_CATALOG)
        .with_odata_type(graph_type("deviceManagementConfigurationPolicy"))
        .with_prefix(PathExpr::key("settingsDelta"))
        .with_prefix(PathExpr::key("templateReference"))
}

/// Endpoint security disk encryption profiles
pub fn disk_encryption_intent() -> TemplateFamilyProfile {
    TemplateFamilyProfile::new(DISK_ENCRYPTION_INTENT)
        .with_odata_type(graph_type("deviceManagementIntent"))
        .with_prefix(PathExpr::key("bitLockerSettings"))
        .with_prefix(PathExpr::key("fileVaultSettings"))
        .with_alias(
            &PathExpr::key("bitLockerEnabled"),
            PathExpr::keys(&["bitLockerSettings", "bitLockerEncryptDevice"]),
        )
        .with_alias(
            &PathExpr::key("fileVaultEnabled"),
            PathExpr::keys(&["fileVaultSettings", "enabled"]),
        )
}

pub fn app_protection() -> TemplateFamilyProfile {
    TemplateFamilyProfile::new(APP_PROTECTION)
        .with_odata_type(graph_type("iosManagedAppProtection"))
        .with_odata_type(graph_type("androidManagedAppProtection"))
        .with_odata_type(graph_type("windowsInformationProtectionPolicy"))
        .with_alias(
            &PathExpr::key("passwordMinimumLength"),
            PathExpr::key("minimumPinLength"),
        )
        .with_alias(
            &PathExpr::key("passwordRequired"),
            PathExpr::key("pinRequired"),
        )
        .with_alias(
            &PathExpr::key("storageRequireEncryption"),
            PathExpr::key("appDataEncryptionType"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_family_names_are_unique() {
        let families = builtin_families();
        let names: BTreeSet<_> = families.iter().map(|f| f.family.to_ascii_lowercase()).collect();
        assert_eq!(names.len(), families.len());
    }

    #[test]
    fn test_odata_types_claimed_once() {
        let families = builtin_families();
        let mut seen = BTreeSet::new();
        for family in &families {
            assert!(!family.odata_types.is_empty(), "{} has no @odata.type", family.family);
            for odata_type in &family.odata_types {
                assert!(odata_type.starts_with(GRAPH));
                assert!(
                    seen.insert(odata_type.to_ascii_lowercase()),
                    "{} claimed twice",
                    odata_type
                );
            }
        }
    }

    #[test]
    fn test_bitlocker_rewrites() {
        let profile = windows_endpoint_protection();
        assert!(profile
            .matches_odata_type("#microsoft.graph.windows10EndpointProtectionConfiguration"));
        assert!(profile
            .matches_odata_type("microsoft.graph.windows10endpointprotectionconfiguration"));

        let candidates = profile.candidate_paths(&PathExpr::key("encryptionMethod"));
        assert_eq!(
            candidates[0],
            PathExpr::keys(&["bitLockerSystemDrivePolicy", "encryptionMethod"])
        );
        assert!(candidates
            .contains(&PathExpr::keys(&["bitLockerRemovableDrivePolicy", "encryptionMethod"])));
    }

    #[test]
    fn test_ios_passcode_alias() {
        let candidates = ios_general().candidate_paths(&PathExpr::key("passwordMinimumLength"));
        assert_eq!(candidates, vec![PathExpr::key("passcodeMinimumLength")]);
    }
}
