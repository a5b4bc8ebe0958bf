// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c)  2025, Lukas Scheller lukasscheller@icloud.com

#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
pub enum NodeKind {
    DesignFile,
    DesignUnit,
    ContextClause,
    LibraryClause,
    UseClause,
    ContextReference,

    EntityDeclaration,
    ArchitectureBody,
    PackageDeclaration,
    PackageBody,
    PackageInstantiation,
    ConfigurationDeclaration,
    ContextDeclaration,

    GenericClause,
    PortClause,
    InterfaceList,
    InterfaceObjectDeclaration,
    InterfaceTypeDeclaration,
    InterfaceSubprogramDeclaration,
    InterfacePackageDeclaration,
    IdentifierList,

    DeclarativePart,
    SignalDeclaration,
    ConstantDeclaration,
    VariableDeclaration,
    FileDeclaration,
    TypeDeclaration,
    SubtypeDeclaration,
    AliasDeclaration,
    AttributeDeclaration,
    AttributeSpecification,
    ComponentDeclaration,
    SubprogramDeclaration,
    SubprogramBody,
    SubprogramInstantiation,
    FunctionSpecification,
    ProcedureSpecification,
    Signature,
    SkippedDeclaration,

    EnumerationTypeDefinition,
    RangeTypeDefinition,
    PhysicalTypeDefinition,
    PrimaryUnitDeclaration,
    SecondaryUnitDeclaration,
    ArrayTypeDefinition,
    IndexSubtypeDefinition,
    RecordTypeDefinition,
    ElementDeclaration,
    AccessTypeDefinition,
    FileTypeDefinition,
    ProtectedTypeDefinition,
    ProtectedTypeBody,

    SubtypeIndication,
    ResolutionIndication,
    RangeConstraint,
    IndexConstraint,
    Range,

    SimpleName,
    SelectedName,
    CallOrIndex,
    AttributeName,
    QualifiedExpression,
    ExternalName,
    AssociationList,
    AssociationElement,
    Literal,
    PhysicalLiteral,
    BinaryExpression,
    UnaryExpression,
    ParenthesizedExpression,
    Aggregate,
    ElementAssociation,
    Choices,
    Allocator,

    Label,
    ConcurrentStatements,
    SequentialStatements,
    ProcessStatement,
    SensitivityList,
    BlockStatement,
    ForGenerateStatement,
    IfGenerateStatement,
    CaseGenerateStatement,
    GenerateBranch,
    GenerateBody,
    ComponentInstantiation,
    InstantiatedUnit,
    GenericMapAspect,
    PortMapAspect,
    SignalAssignment,
    SelectedSignalAssignment,
    SelectedWaveform,
    ConditionalWaveform,
    Waveform,
    WaveformElement,
    DelayMechanism,
    VariableAssignment,
    ProcedureCall,
    AssertStatement,
    ReportStatement,
    IfStatement,
    ConditionalBranch,
    ElseBranch,
    CaseStatement,
    CaseAlternative,
    LoopStatement,
    WhileScheme,
    ForScheme,
    NextStatement,
    ExitStatement,
    ReturnStatement,
    NullStatement,
    WaitStatement,

    /// Tokens skipped while recovering from a syntax error
    Error,
}

impl NodeKind {
    /// Nodes that denote a value, name or range inside an expression.
    pub fn is_expression(&self) -> bool {
        use NodeKind::*;
        matches!(
            self,
            SimpleName
                | SelectedName
                | CallOrIndex
                | AttributeName
                | QualifiedExpression
                | ExternalName
                | Literal
                | PhysicalLiteral
                | BinaryExpression
                | UnaryExpression
                | ParenthesizedExpression
                | Aggregate
                | Allocator
                | Range
        )
    }
}
