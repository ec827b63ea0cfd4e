//! Integration tests for membrane requirements on the read path.

mod common;

use common::{common_catalog, held_by, Fixture, User};
use granary_core::id::{GrainId, TokenId};
use granary_permissions::model::{
    MembraneRequirement, OwnerDescriptor, PermissionHolder, PermissionVector, RoleAssignment,
    Token,
};
use granary_permissions::store::GrainStore;

#[test]
fn test_membrane_requirements() {
    let fx = Fixture::new();
    let alice = fx.user();
    let bob = fx.user();
    let carol = fx.user();
    let alice_grain = fx.grain(&alice, common_catalog());
    let bob_grain = fx.grain(&bob, common_catalog());

    let requirement = held_by(bob_grain, &carol, &[true, false, false]);
    let webkey =
        fx.share_to_webkey(&alice, alice_grain, RoleAssignment::AllAccess, vec![requirement]);
    assert!(!fx.webkey_may_open(&webkey));

    let to_carol = fx.share_to_account(&bob, bob_grain, &carol, RoleAssignment::role(1), vec![]);
    assert!(fx.may_open(&carol, bob_grain));
    assert!(fx.webkey_may_open(&webkey));

    fx.revoke(&to_carol);
    assert!(!fx.webkey_may_open(&webkey));

    // carol's new share only holds while alice can open bob's grain
    let requirement1 = held_by(bob_grain, &alice, &[true, false, false]);
    fx.share_to_account(&bob, bob_grain, &carol, RoleAssignment::role(1), vec![requirement1]);
    assert!(!fx.webkey_may_open(&webkey));

    fx.share_to_account(&bob, bob_grain, &alice, RoleAssignment::role(1), vec![]);
    assert!(fx.webkey_may_open(&webkey));
}

#[test]
fn test_membrane_requirements_sequence() {
    let fx = Fixture::new();
    let alice = fx.user();
    let bob = fx.user();
    let carol = fx.user();
    let alice_grain = fx.grain(&alice, common_catalog());
    let bob_grain = fx.grain(&bob, common_catalog());

    let parent = fx.share_to_webkey(
        &alice,
        alice_grain,
        RoleAssignment::AllAccess,
        vec![held_by(bob_grain, &carol, &[true, false, false])],
    );
    let child = fx.reshare_to_webkey(
        &parent,
        RoleAssignment::AllAccess,
        vec![held_by(bob_grain, &carol, &[true, false, true])],
    );
    assert!(!fx.webkey_may_open(&child));

    fx.share_to_account(&bob, bob_grain, &carol, RoleAssignment::role(1), vec![]);
    assert!(!fx.webkey_may_open(&child));

    fx.share_to_account(&bob, bob_grain, &carol, RoleAssignment::role(2), vec![]);
    assert!(fx.webkey_may_open(&child));
}

#[test]
fn test_membrane_requirements_loop() {
    let fx = Fixture::new();
    let alice = fx.user();
    let bob = fx.user();
    let alice_grain = fx.grain(&alice, common_catalog());
    let bob_grain = fx.grain(&bob, common_catalog());

    fx.share_to_account(
        &alice,
        alice_grain,
        &bob,
        RoleAssignment::AllAccess,
        vec![held_by(bob_grain, &alice, &[])],
    );
    fx.share_to_account(
        &bob,
        bob_grain,
        &alice,
        RoleAssignment::AllAccess,
        vec![held_by(alice_grain, &bob, &[])],
    );

    assert!(fx.may_open(&alice, alice_grain));
    assert!(!fx.may_open(&bob, alice_grain));
    assert!(fx.may_open(&bob, bob_grain));
    assert!(!fx.may_open(&alice, bob_grain));

    assert_eq!(fx.permissions(&alice, bob_grain), None);
    assert_eq!(fx.permissions(&bob, alice_grain), None);
}

fn mutually_conditional_shares() -> (Fixture, User, User, GrainId, GrainId) {
    let fx = Fixture::new();
    let alice = fx.user();
    let bob = fx.user();
    let alice_grain = fx.grain(&alice, common_catalog());
    let bob_grain = fx.grain(&bob, common_catalog());

    fx.share_to_account(
        &alice,
        alice_grain,
        &bob,
        RoleAssignment::AllAccess,
        vec![held_by(bob_grain, &alice, &[])],
    );
    fx.share_to_account(
        &bob,
        bob_grain,
        &alice,
        RoleAssignment::AllAccess,
        vec![held_by(alice_grain, &bob, &[])],
    );
    (fx, alice, bob, alice_grain, bob_grain)
}

#[test]
fn test_membrane_requirements_loop_broken_by_new_share() {
    let (fx, alice, bob, alice_grain, bob_grain) = mutually_conditional_shares();
    assert!(!fx.may_open(&alice, bob_grain));
    assert!(!fx.may_open(&bob, alice_grain));

    // An unconditional share closes the loop for both sides
    fx.share_to_account(&bob, bob_grain, &alice, RoleAssignment::role(1), vec![]);

    assert!(fx.may_open(&alice, bob_grain));
    assert!(fx.may_open(&bob, alice_grain));
    assert_eq!(fx.permissions(&bob, alice_grain), Some(vec![true, true, true]));
    assert_eq!(fx.permissions(&alice, bob_grain), Some(vec![true, true, true]));
}

#[test]
fn test_membrane_requirements_loop_unaffected_by_unrelated_share() {
    let (fx, alice, bob, alice_grain, bob_grain) = mutually_conditional_shares();
    let carol = fx.user();

    fx.share_to_account(&bob, bob_grain, &carol, RoleAssignment::AllAccess, vec![]);

    assert!(fx.may_open(&carol, bob_grain));
    assert!(!fx.may_open(&alice, bob_grain));
    assert!(!fx.may_open(&bob, alice_grain));
    assert_eq!(fx.permissions(&alice, bob_grain), None);
    assert_eq!(fx.permissions(&bob, alice_grain), None);
}

#[test]
fn test_membrane_requirements_nontrivial_normalization() {
    let fx = Fixture::new();
    let alice = fx.user();
    let bob = fx.user();
    let carol = fx.user();
    let grain = fx.grain(&alice, common_catalog());

    let webkey = fx.share_to_webkey(
        &alice,
        grain,
        RoleAssignment::role(2),
        vec![held_by(grain, &carol, &[true, true, true])],
    );
    assert!(!fx.webkey_may_open(&webkey));

    fx.share_to_account(
        &alice,
        grain,
        &carol,
        RoleAssignment::role(1),
        vec![held_by(grain, &bob, &[true, true, false])],
    );
    assert!(!fx.webkey_may_open(&webkey));

    fx.share_to_account(
        &alice,
        grain,
        &carol,
        RoleAssignment::role(2),
        vec![held_by(grain, &bob, &[true, false, true])],
    );
    assert!(!fx.webkey_may_open(&webkey));

    fx.share_to_account(
        &alice,
        grain,
        &carol,
        RoleAssignment::role(4),
        vec![held_by(grain, &bob, &[true, true, true])],
    );
    assert!(!fx.webkey_may_open(&webkey));

    fx.share_to_account(&alice, grain, &bob, RoleAssignment::role(1), vec![]);
    assert!(!fx.webkey_may_open(&webkey));

    fx.share_to_account(&alice, grain, &bob, RoleAssignment::role(4), vec![]);
    assert!(!fx.webkey_may_open(&webkey));

    fx.share_to_account(&alice, grain, &bob, RoleAssignment::AllAccess, vec![]);
    assert!(fx.webkey_may_open(&webkey));
}

#[test]
fn test_user_is_admin_requirements() {
    let fx = Fixture::new();
    let alice = fx.user();
    let bob = fx.user();
    let grain = fx.grain(&alice, common_catalog());

    let webkey = fx.share_to_webkey(
        &alice,
        grain,
        RoleAssignment::AllAccess,
        vec![MembraneRequirement::UserIsAdmin {
            account_id: alice.account.id,
        }],
    );
    assert!(!fx.webkey_may_open(&webkey));
    assert_eq!(fx.webkey_permissions(&webkey), None);

    fx.store.set_admin(&alice.account.id, true).unwrap();
    assert!(fx.webkey_may_open(&webkey));
    assert_eq!(fx.webkey_permissions(&webkey), Some(vec![true, true, true]));

    let child = fx.reshare_to_webkey(
        &webkey,
        RoleAssignment::AllAccess,
        vec![MembraneRequirement::UserIsAdmin {
            account_id: bob.account.id,
        }],
    );
    assert!(!fx.webkey_may_open(&child));
    assert_eq!(fx.webkey_permissions(&child), None);

    fx.store.set_admin(&bob.account.id, true).unwrap();
    assert!(fx.webkey_may_open(&child));
    assert_eq!(fx.webkey_permissions(&child), Some(vec![true, true, true]));
}

#[test]
fn test_token_valid_requirements() {
    let fx = Fixture::new();
    let alice = fx.user();
    let bob = fx.user();
    let grain = fx.grain(&alice, common_catalog());
    let elsewhere = GrainId::new();

    let token_id = TokenId::new("required-token");
    let webkey = fx.share_to_webkey(
        &alice,
        grain,
        RoleAssignment::AllAccess,
        vec![MembraneRequirement::TokenValid {
            token_id: token_id.clone(),
        }],
    );
    assert!(!fx.webkey_may_open(&webkey));
    assert_eq!(fx.webkey_permissions(&webkey), None);

    let bare = |id: &TokenId| {
        Token::new(
            id.clone(),
            elsewhere,
            OwnerDescriptor::Webkey { for_sharing: false },
        )
    };
    fx.store.insert_token(bare(&token_id)).unwrap();
    assert!(fx.webkey_may_open(&webkey));
    assert_eq!(fx.webkey_permissions(&webkey), Some(vec![true, true, true]));

    let child_id = TokenId::new("required-child");
    let mut child = bare(&child_id);
    child.parent_token = Some(token_id.clone());
    child.requirements.push(held_by(grain, &bob, &[]));
    fx.store.insert_token(child).unwrap();

    let webkey2 = fx.share_to_webkey(
        &alice,
        grain,
        RoleAssignment::AllAccess,
        vec![MembraneRequirement::TokenValid {
            token_id: child_id.clone(),
        }],
    );
    assert!(!fx.webkey_may_open(&webkey2));
    assert_eq!(fx.webkey_permissions(&webkey2), None);

    fx.share_to_account(&alice, grain, &bob, RoleAssignment::AllAccess, vec![]);
    assert!(fx.webkey_may_open(&webkey2));
    assert_eq!(fx.webkey_permissions(&webkey2), Some(vec![true, true, true]));

    fx.store.remove_token(&token_id).unwrap();
    assert!(!fx.webkey_may_open(&webkey2));
    assert_eq!(fx.webkey_permissions(&webkey2), None);
}

#[test]
fn test_collections_app_basic_requirements() {
    let fx = Fixture::new();
    let alice = fx.user();
    let bob = fx.user();
    let collection = fx.grain(&alice, common_catalog());
    let other = fx.grain(&alice, common_catalog());

    fx.share_to_account(&alice, collection, &bob, RoleAssignment::AllAccess, vec![]);
    assert!(fx.may_open(&bob, collection));
    assert!(!fx.may_open(&bob, other));

    let webkey = fx.share_to_webkey(
        &alice,
        other,
        RoleAssignment::AllAccess,
        vec![held_by(collection, &alice, &[])],
    );
    assert!(fx.may_open(&bob, collection));
    assert!(!fx.may_open(&bob, other));

    fx.reshare_to_account(
        &webkey,
        &bob,
        RoleAssignment::AllAccess,
        vec![held_by(collection, &bob, &[])],
    );
    assert!(fx.may_open(&bob, collection));
    assert!(fx.may_open(&bob, other));
}

#[test]
fn test_permissions_held_by_token() {
    let fx = Fixture::new();
    let alice = fx.user();
    let bob = fx.user();
    let grain = fx.grain(&alice, common_catalog());

    let webkey = fx.share_to_webkey(&alice, grain, RoleAssignment::AllAccess, vec![]);
    assert!(fx.webkey_may_open(&webkey));

    fx.share_to_account(
        &alice,
        grain,
        &bob,
        RoleAssignment::AllAccess,
        vec![MembraneRequirement::PermissionsHeld {
            grain_id: grain,
            holder: PermissionHolder::Token(webkey.id.clone()),
            permissions: PermissionVector::empty(),
        }],
    );
    assert!(fx.may_open(&bob, grain));

    fx.revoke(&webkey.id);
    assert!(!fx.may_open(&bob, grain));
}

#[test]
fn test_exercise_time_validation_matches_read_path() {
    let fx = Fixture::new();
    let alice = fx.user();
    let bob = fx.user();
    let grain = fx.grain(&alice, common_catalog());

    let to_bob = fx.share_to_account(&alice, grain, &bob, RoleAssignment::role(4), vec![]);
    let requirements = vec![
        held_by(grain, &bob, &[true, true, false]),
        MembraneRequirement::TokenValid {
            token_id: to_bob.clone(),
        },
    ];
    assert!(fx.engine.check_requirements(&requirements).is_ok());

    fx.revoke(&to_bob);
    assert!(fx.engine.check_requirements(&requirements).is_err());
}
