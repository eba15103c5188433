/// Package of the app under test.
pub const TARGET_PACKAGE: &str = "org.wikipedia";

/// Activities the app may land on at launch, depending on whether the
/// onboarding flow still has to run.
pub const VALID_ACTIVITIES: &[&str] = &[
    "MainActivity",
    "InitialOnboardingActivity",
    "OnboardingActivity",
];

pub fn is_valid_activity(activity: &str) -> bool {
    VALID_ACTIVITIES.iter().any(|name| activity.contains(name))
}
